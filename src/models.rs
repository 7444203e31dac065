use serde::{Deserialize, Serialize};

/// Declared column widths (characters) / 字段宽度上限
pub const USERNAME_MAX: usize = 20;
pub const EMAIL_MAX: usize = 254;
pub const PASSWORD_MAX: usize = 128;
pub const NICKNAME_MAX: usize = 50;
pub const NAME_MAX: usize = 30;
pub const ID_CARD_MAX: usize = 18;
pub const PHONE_MAX: usize = 11;

/// 一条已入库的记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Record {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub nickname: String,
    pub name: String,
    pub id_card: String,
    pub phone: String,
}

/// 待写入的记录（尚未分配 id）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub username: String,
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub name: String,
    pub id_card: String,
    pub phone: String,
}

impl NewRecord {
    /// First field whose value is longer than its declared width / 第一个超出宽度的字段
    pub fn exceeds_declared_widths(&self) -> Option<&'static str> {
        let fields = [
            ("username", &self.username, USERNAME_MAX),
            ("email", &self.email, EMAIL_MAX),
            ("password", &self.password, PASSWORD_MAX),
            ("nickname", &self.nickname, NICKNAME_MAX),
            ("name", &self.name, NAME_MAX),
            ("id_card", &self.id_card, ID_CARD_MAX),
            ("phone", &self.phone, PHONE_MAX),
        ];
        fields
            .into_iter()
            .find(|(_, value, max)| value.chars().count() > *max)
            .map(|(field, _, _)| field)
    }
}

/// Pagination metadata / 分页信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// `page` and `page_size` are expected to be clamped to >= 1 already
    pub fn new(page: i64, page_size: i64, total_count: i64) -> Self {
        let total_pages = if total_count <= 0 {
            0
        } else {
            (total_count + page_size - 1) / page_size
        };
        Self {
            page,
            page_size,
            total_count,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// Row offset of the first item on `page` / 当前页第一条的偏移量
    pub fn offset_for(page: i64, page_size: i64) -> i64 {
        (page.max(1) - 1).saturating_mul(page_size)
    }
}
