//! 任务存储操作

use super::SeaOrmStorage;
use crate::entity::phases::Entity as Phases;
use crate::entity::tasks::{ActiveModel, Column, Entity as Tasks};
use crate::errors::{ContestError, Result};
use crate::models::tasks::{CreateTaskRequest, Task, TaskListQuery};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建任务，所属阶段必须存在
    pub async fn create_task_impl(&self, req: CreateTaskRequest) -> Result<Task> {
        let phase = Phases::find_by_id(req.phase_id)
            .one(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询阶段失败: {e}")))?;
        if phase.is_none() {
            return Err(ContestError::not_found(format!(
                "Phase {} not found",
                req.phase_id
            )));
        }

        let now = chrono::Utc::now().timestamp();
        let model = ActiveModel {
            phase_id: Set(req.phase_id),
            title: Set(req.title),
            description: Set(req.description),
            deadline: Set(req.deadline.timestamp()),
            max_score: Set(req.max_score),
            is_active: Set(true),
            created_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await?;
        Ok(result.into_task())
    }

    pub async fn get_task_by_id_impl(&self, task_id: i64) -> Result<Option<Task>> {
        let result = Tasks::find_by_id(task_id)
            .one(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询任务失败: {e}")))?;

        Ok(result.map(|m| m.into_task()))
    }

    /// 按截止时间升序列出任务
    pub async fn list_tasks_impl(&self, query: TaskListQuery) -> Result<Vec<Task>> {
        let mut select = Tasks::find();

        if let Some(phase_id) = query.phase_id {
            select = select.filter(Column::PhaseId.eq(phase_id));
        }
        if query.active_only {
            select = select.filter(Column::IsActive.eq(true));
        }

        let tasks = select
            .order_by_asc(Column::Deadline)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| ContestError::database_operation(format!("查询任务列表失败: {e}")))?;

        Ok(tasks.into_iter().map(|m| m.into_task()).collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{DateTime, Duration, Utc};

    use super::super::phases::tests::phase_request;
    use super::*;

    pub(crate) fn task_request(phase_id: i64, title: &str, deadline: DateTime<Utc>) -> CreateTaskRequest {
        CreateTaskRequest {
            phase_id,
            title: title.to_string(),
            description: None,
            deadline,
            max_score: 100.0,
        }
    }

    #[tokio::test]
    async fn task_requires_existing_phase() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let err = storage
            .create_task_impl(task_request(42, "Orphan", Utc::now()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E008");
        assert!(
            storage
                .list_tasks_impl(TaskListQuery::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn tasks_filtered_by_phase_and_sorted_by_deadline() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let p1 = storage.create_phase_impl(phase_request("P1", 0)).await.unwrap();
        let p2 = storage.create_phase_impl(phase_request("P2", 5)).await.unwrap();
        let now = Utc::now();

        let later = storage
            .create_task_impl(task_request(p1.id, "Later", now + Duration::days(3)))
            .await
            .unwrap();
        let sooner = storage
            .create_task_impl(task_request(p1.id, "Sooner", now + Duration::days(1)))
            .await
            .unwrap();
        storage
            .create_task_impl(task_request(p2.id, "Other", now))
            .await
            .unwrap();

        let tasks = storage
            .list_tasks_impl(TaskListQuery {
                phase_id: Some(p1.id),
                active_only: true,
            })
            .await
            .unwrap();
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![sooner.id, later.id]);
        assert!(tasks.iter().all(|t| t.is_active));

        let all = storage.list_tasks_impl(TaskListQuery::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn deadline_round_trips_to_the_second() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let phase = storage.create_phase_impl(phase_request("P", 0)).await.unwrap();
        let deadline = DateTime::<Utc>::from_timestamp(1_900_000_000, 0).unwrap();
        let task = storage
            .create_task_impl(task_request(phase.id, "T", deadline))
            .await
            .unwrap();

        let fetched = storage.get_task_by_id_impl(task.id).await.unwrap().unwrap();
        assert_eq!(fetched.deadline, deadline);
        assert!(!fetched.is_expired(deadline));
        assert!(fetched.is_expired(deadline + Duration::seconds(1)));
    }
}
