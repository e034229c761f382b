//! 比赛阶段存储操作

use super::SeaOrmStorage;
use crate::entity::phases::{ActiveModel, Column, Entity as Phases};
use crate::errors::{ContestError, Result};
use crate::models::phases::{CreatePhaseRequest, Phase};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

impl SeaOrmStorage {
    pub async fn create_phase_impl(&self, req: CreatePhaseRequest) -> Result<Phase> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(req.name),
            description: Set(req.description),
            start_date: Set(req.start_date.timestamp()),
            end_date: Set(req.end_date.timestamp()),
            is_active: Set(false),
            created_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("创建阶段失败: {e}")))?;

        Ok(result.into_phase())
    }

    /// 激活指定阶段并停用其余阶段，整个切换在一个事务内完成
    pub async fn activate_phase_impl(&self, phase_id: i64) -> Result<Phase> {
        let txn = self.db.begin().await?;

        // SQLite 的首个写语句即持有库级写锁；其他库在 READ COMMITTED 下
        // 需先按 id 顺序锁住全部阶段行，否则并发激活会各自漏掉对方
        if txn.get_database_backend() != DbBackend::Sqlite {
            Phases::find()
                .order_by_asc(Column::Id)
                .lock_exclusive()
                .all(&txn)
                .await?;
        }

        // 激活目标的同时确认其存在
        let activated = Phases::update_many()
            .col_expr(Column::IsActive, Expr::value(true))
            .filter(Column::Id.eq(phase_id))
            .exec(&txn)
            .await?;
        if activated.rows_affected == 0 {
            return Err(ContestError::not_found(format!(
                "Phase {phase_id} not found"
            )));
        }

        Phases::update_many()
            .col_expr(Column::IsActive, Expr::value(false))
            .filter(Column::IsActive.eq(true))
            .filter(Column::Id.ne(phase_id))
            .exec(&txn)
            .await?;

        let phase = Phases::find_by_id(phase_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ContestError::not_found(format!("Phase {phase_id} not found")))?;

        txn.commit().await?;
        Ok(phase.into_phase())
    }

    pub async fn get_active_phase_impl(&self) -> Result<Option<Phase>> {
        let result = Phases::find()
            .filter(Column::IsActive.eq(true))
            .one(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询激活阶段失败: {e}")))?;

        Ok(result.map(|m| m.into_phase()))
    }

    pub async fn get_phase_by_id_impl(&self, phase_id: i64) -> Result<Option<Phase>> {
        let result = Phases::find_by_id(phase_id)
            .one(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询阶段失败: {e}")))?;

        Ok(result.map(|m| m.into_phase()))
    }

    /// 按开始时间升序列出
    pub async fn list_phases_impl(&self) -> Result<Vec<Phase>> {
        let phases = Phases::find()
            .order_by_asc(Column::StartDate)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询阶段列表失败: {e}")))?;

        Ok(phases.into_iter().map(|m| m.into_phase()).collect())
    }
}
