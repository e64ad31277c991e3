//! # 操作日志服务

use chrono::{NaiveDate, Utc};
use entity::{operation_logs, operation_logs::Entity as OperationLogs};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::management::response::Pagination;
use crate::management::server::AppState;
use crate::types::day_bounds;

use super::shared::{PaginationParams, build_page};

/// 日志列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub operator: Option<String>,
    pub action: Option<String>,
    pub date: Option<NaiveDate>,
}

/// 日志响应
#[derive(Debug, Serialize)]
pub struct LogResponse {
    pub id: i32,
    pub operator: String,
    pub action: String,
    pub target: Option<String>,
    pub detail: Option<String>,
    pub created_at: String,
}

impl From<operation_logs::Model> for LogResponse {
    fn from(log: operation_logs::Model) -> Self {
        Self {
            id: log.id,
            operator: log.operator,
            action: log.action,
            target: log.target,
            detail: log.detail,
            created_at: log.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ListLogsResult {
    pub logs: Vec<LogResponse>,
    pub pagination: Pagination,
}

/// 操作日志服务
pub struct LogsService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> LogsService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: state.database.as_ref(),
        }
    }

    #[must_use]
    pub const fn with_db(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// 写入一条操作日志
    pub async fn record(
        &self,
        operator: &str,
        action: &str,
        target: Option<&str>,
        detail: Option<&str>,
    ) -> Result<()> {
        let log = operation_logs::ActiveModel {
            operator: Set(operator.to_string()),
            action: Set(action.to_string()),
            target: Set(target.map(ToString::to_string)),
            detail: Set(detail.map(ToString::to_string)),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };
        log.insert(self.db).await?;
        Ok(())
    }

    /// 分页查询日志
    pub async fn list(&self, query: &LogQuery) -> Result<ListLogsResult> {
        let params = PaginationParams::new(query.page, query.limit, 20, 100);

        let mut select = OperationLogs::find();
        if let Some(operator) = &query.operator {
            select = select.filter(operation_logs::Column::Operator.eq(operator));
        }
        if let Some(action) = &query.action {
            select = select.filter(operation_logs::Column::Action.eq(action));
        }
        if let Some(date) = query.date {
            let (start, end) = day_bounds(date);
            select = select
                .filter(operation_logs::Column::CreatedAt.gte(start))
                .filter(operation_logs::Column::CreatedAt.lt(end));
        }

        let total = select.clone().count(self.db).await?;
        let rows = select
            .order_by_desc(operation_logs::Column::Id)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db)
            .await?;

        Ok(ListLogsResult {
            logs: rows.into_iter().map(LogResponse::from).collect(),
            pagination: build_page(total, params).into(),
        })
    }

    /// 清空日志，返回删除条数
    pub async fn clear(&self) -> Result<u64> {
        let result = OperationLogs::delete_many().exec(self.db).await?;
        Ok(result.rows_affected)
    }
}

/// 记录操作日志；失败只告警，不影响主流程
pub async fn log_operation(
    db: &DatabaseConnection,
    operator: &str,
    action: &str,
    target: Option<&str>,
    detail: Option<&str>,
) {
    let service = LogsService::with_db(db);
    if let Err(e) = service.record(operator, action, target, detail).await {
        warn!("操作日志写入失败: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::helpers::create_test_db;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn record_list_clear() {
        let db = create_test_db().await.unwrap();
        let service = LogsService::with_db(&db);

        service
            .record("admin", "approve_leave", Some("leave:1"), Some("批准请假"))
            .await
            .unwrap();
        service
            .record("counselor01", "create_student", Some("student:20230001"), None)
            .await
            .unwrap();

        let all = service.list(&LogQuery::default()).await.unwrap();
        assert_eq!(all.logs.len(), 2);
        // 最新的排在最前
        assert_eq!(all.logs[0].operator, "counselor01");

        let filtered = service
            .list(&LogQuery {
                operator: Some("admin".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(filtered.logs.len(), 1);
        assert_eq!(filtered.logs[0].action, "approve_leave");

        let removed = service.clear().await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(service.list(&LogQuery::default()).await.unwrap().logs.len(), 0);
    }
}
