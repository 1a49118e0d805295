/// Account row used for login. `tenant_id` scopes every query the user makes.
#[derive(Debug, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub tenant_id: u64,
    pub username: String,
    pub password: String,
    pub role_id: u8,
    pub employee_id: Option<u64>,
}
