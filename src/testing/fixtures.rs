//! # 测试数据 Fixtures
//!
//! 提供测试用的预设数据构建器

use bcrypt::{DEFAULT_COST, hash};
use chrono::Utc;
use entity::{devices, students, users};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// 学生测试数据构建器
pub struct StudentFixture {
    pub student_id: String,
    pub name: String,
    pub class_name: String,
    pub building: String,
    pub room: String,
}

impl Default for StudentFixture {
    fn default() -> Self {
        Self {
            student_id: "20230001".to_string(),
            name: "张三".to_string(),
            class_name: "软件2301".to_string(),
            building: "6号楼".to_string(),
            room: "302".to_string(),
        }
    }
}

impl StudentFixture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn student_id(mut self, student_id: &str) -> Self {
        self.student_id = student_id.to_string();
        self
    }

    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    #[must_use]
    pub fn building(mut self, building: &str) -> Self {
        self.building = building.to_string();
        self
    }

    pub async fn insert(self, db: &DatabaseConnection) -> students::Model {
        let now = Utc::now().naive_utc();
        students::ActiveModel {
            student_id: Set(self.student_id),
            name: Set(self.name),
            gender: Set("男".to_string()),
            class_name: Set(self.class_name),
            building: Set(self.building),
            area: Set("东区".to_string()),
            floor: Set("3".to_string()),
            room: Set(self.room),
            bed: Set("2".to_string()),
            counselor_name: Set("王老师".to_string()),
            counselor_phone: Set("13800138000".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("插入学生测试数据失败")
    }
}

/// 设备测试数据构建器
pub struct DeviceFixture {
    pub device_id: String,
    pub building: String,
    pub status: String,
}

impl Default for DeviceFixture {
    fn default() -> Self {
        Self {
            device_id: "FP-A-01".to_string(),
            building: "6号楼".to_string(),
            status: "active".to_string(),
        }
    }
}

impl DeviceFixture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn device_id(mut self, device_id: &str) -> Self {
        self.device_id = device_id.to_string();
        self
    }

    #[must_use]
    pub fn building(mut self, building: &str) -> Self {
        self.building = building.to_string();
        self
    }

    #[must_use]
    pub fn status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub async fn insert(self, db: &DatabaseConnection) -> devices::Model {
        let now = Utc::now().naive_utc();
        devices::ActiveModel {
            device_id: Set(self.device_id.clone()),
            name: Set(format!("{} 门禁", self.device_id)),
            building: Set(self.building),
            sequence: Set(1),
            max_fingerprints: Set(1000),
            status: Set(self.status),
            last_seen: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("插入设备测试数据失败")
    }
}

/// 用户测试数据构建器
pub struct UserFixture {
    pub username: String,
    pub password: String,
    pub role: String,
    pub is_active: bool,
}

impl Default for UserFixture {
    fn default() -> Self {
        Self {
            username: "counselor01".to_string(),
            password: "pass123".to_string(),
            role: "counselor".to_string(),
            is_active: true,
        }
    }
}

impl UserFixture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    #[must_use]
    pub fn password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    #[must_use]
    pub fn admin(mut self) -> Self {
        self.role = "admin".to_string();
        self
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub async fn insert(self, db: &DatabaseConnection) -> users::Model {
        let now = Utc::now().naive_utc();
        let password_hash = hash(&self.password, DEFAULT_COST).expect("bcrypt 哈希失败");
        users::ActiveModel {
            username: Set(self.username.clone()),
            password_hash: Set(password_hash),
            salt: Set("test_salt_32_chars_long_12345678".to_string()),
            display_name: Set(self.username),
            role: Set(self.role),
            is_active: Set(self.is_active),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("插入用户测试数据失败")
    }
}
