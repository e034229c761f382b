use rand::Rng;

/// 队伍码字母表：去掉了易混淆的 0/O、1/I
pub const TEAM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const TEAM_CODE_LEN: usize = 6;

/// 生成一个候选队伍码，唯一性由存储层保证
pub fn generate_team_code() -> String {
    let mut rng = rand::rng();
    (0..TEAM_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..TEAM_CODE_ALPHABET.len());
            TEAM_CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// 生成指定长度的随机口令（字母数字混合），用于初始化管理员
pub fn generate_password(len: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz23456789";
    let mut rng = rand::rng();
    let mut password: String = (0..len.saturating_sub(1))
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect();
    // 保证至少一位数字
    password.push(char::from(b'2' + rng.random_range(0..8u8)));
    password
}

/// 队伍码比较不区分大小写，统一转为大写
pub fn normalize_team_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
