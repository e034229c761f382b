/// 验证文件内容的魔术字节是否与 MIME 类型匹配
///
/// # Arguments
/// * `data` - 文件内容的前几个字节
/// * `mime` - 声明的 MIME 类型，如 "application/pdf"
///
/// # Returns
/// * `true` - 魔术字节匹配
/// * `false` - 不匹配或该类型不受支持
pub fn validate_magic_bytes(data: &[u8], mime: &str) -> bool {
    if data.is_empty() {
        return false;
    }

    match mime.to_ascii_lowercase().as_str() {
        "application/pdf" => data.starts_with(b"%PDF-"),
        "image/png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
        "image/jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
        "application/zip" => data.starts_with(&[0x50, 0x4B, 0x03, 0x04]),
        // 未知格式 - 默认拒绝
        _ => false,
    }
}

/// MIME 类型对应的落盘扩展名
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime.to_ascii_lowercase().as_str() {
        "application/pdf" => Some("pdf"),
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "application/zip" => Some("zip"),
        _ => None,
    }
}

/// 魔术字节判定所需的最少字节数
pub const MAGIC_PREFIX_LEN: usize = 8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_magic() {
        assert!(validate_magic_bytes(b"%PDF-1.4\n", "application/pdf"));
        assert!(validate_magic_bytes(b"%PDF-1.7", "APPLICATION/PDF"));
        assert!(!validate_magic_bytes(b"%PDX-1.4", "application/pdf"));
        assert!(!validate_magic_bytes(b"%PDF-1.4", "image/png"));
    }

    #[test]
    fn test_png_disguised_as_pdf() {
        let png_header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert!(validate_magic_bytes(&png_header, "image/png"));
        assert!(!validate_magic_bytes(&png_header, "application/pdf"));
    }

    #[test]
    fn test_empty_data() {
        assert!(!validate_magic_bytes(&[], "application/pdf"));
    }

    #[test]
    fn test_unknown_mime() {
        assert!(!validate_magic_bytes(b"MZ\x90\x00", "application/x-msdownload"));
        assert_eq!(extension_for_mime("application/pdf"), Some("pdf"));
        assert_eq!(extension_for_mime("text/plain"), None);
    }
}
