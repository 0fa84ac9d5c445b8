//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::{db_err, write_err};
use crate::domain::user::{
    GetUserDto, PasswordReset, ProfilePhoto, StudentProfile, User, UserRepository, UserRole,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::user;
use crate::shared::PaginatedResult;

// ── Conversion helpers ──────────────────────────────────────────

fn role_to_domain(role: user::UserRole) -> UserRole {
    match role {
        user::UserRole::Admin => UserRole::Admin,
        user::UserRole::Staff => UserRole::Staff,
        user::UserRole::Student => UserRole::Student,
        user::UserRole::Driver => UserRole::Driver,
    }
}

fn role_to_entity(role: UserRole) -> user::UserRole {
    match role {
        UserRole::Admin => user::UserRole::Admin,
        UserRole::Staff => user::UserRole::Staff,
        UserRole::Student => user::UserRole::Student,
        UserRole::Driver => user::UserRole::Driver,
    }
}

fn model_to_domain(m: user::Model) -> User {
    let profile_photo = match (m.photo_data, m.photo_content_type) {
        (Some(data), Some(content_type)) => Some(ProfilePhoto {
            size: m.photo_size.unwrap_or(data.len() as i64),
            data,
            content_type,
        }),
        _ => None,
    };

    User {
        id: m.id,
        email: m.email,
        password_hash: m.password_hash,
        role: role_to_domain(m.role),
        is_active: m.is_active,
        name: m.name,
        phone: m.phone,
        profile_photo,
        student: StudentProfile {
            entry_number: m.entry_number,
            programme: m.programme,
            department: m.department,
            hostel: m.hostel,
            emergency_contact: m.emergency_contact,
            disability_info: m.disability_info,
            expiry_date: m.expiry_date,
        },
        is_expired: m.is_expired,
        qr_code: m.qr_code,
        reset: PasswordReset {
            otp: m.reset_password_otp,
            otp_expires: m.reset_password_otp_expires,
            token: m.reset_password_token,
            token_expires: m.reset_password_expires,
        },
        created_at: m.created_at,
        updated_at: m.updated_at,
        last_login_at: m.last_login_at,
    }
}

fn domain_to_active(u: User) -> user::ActiveModel {
    let (photo_data, photo_content_type, photo_size) = match u.profile_photo {
        Some(p) => (Some(p.data), Some(p.content_type), Some(p.size)),
        None => (None, None, None),
    };

    user::ActiveModel {
        id: Set(u.id),
        email: Set(u.email),
        password_hash: Set(u.password_hash),
        role: Set(role_to_entity(u.role)),
        is_active: Set(u.is_active),
        name: Set(u.name),
        phone: Set(u.phone),
        photo_data: Set(photo_data),
        photo_content_type: Set(photo_content_type),
        photo_size: Set(photo_size),
        entry_number: Set(u.student.entry_number),
        programme: Set(u.student.programme),
        department: Set(u.student.department),
        hostel: Set(u.student.hostel),
        emergency_contact: Set(u.student.emergency_contact),
        disability_info: Set(u.student.disability_info),
        expiry_date: Set(u.student.expiry_date),
        is_expired: Set(u.is_expired),
        qr_code: Set(u.qr_code),
        reset_password_otp: Set(u.reset.otp),
        reset_password_otp_expires: Set(u.reset.otp_expires),
        reset_password_token: Set(u.reset.token),
        reset_password_expires: Set(u.reset.token_expires),
        created_at: Set(u.created_at),
        updated_at: Set(u.updated_at),
        last_login_at: Set(u.last_login_at),
    }
}

fn email_taken() -> DomainError {
    DomainError::Conflict("Email already exists".to_string())
}

// ── SeaOrmUserRepository ────────────────────────────────────────

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_reset_token(&self, token: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::ResetPasswordToken.eq(token))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_role(&self, role: UserRole) -> DomainResult<Vec<User>> {
        let models = user::Entity::find()
            .filter(user::Column::Role.eq(role_to_entity(role)))
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_all(&self) -> DomainResult<Vec<User>> {
        let models = user::Entity::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn list(&self, query: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        let mut select = user::Entity::find();

        if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(user::Column::Name.contains(term))
                    .add(user::Column::Email.contains(term.to_lowercase())),
            );
        }
        if let Some(role) = query.role {
            select = select.filter(user::Column::Role.eq(role_to_entity(role)));
        }
        if let Some(active) = query.is_active {
            select = select.filter(user::Column::IsActive.eq(active));
        }

        let total = select.clone().count(&self.db).await.map_err(db_err)?;

        let offset = (query.page.max(1) - 1) as u64 * query.limit as u64;
        let models = select
            .order_by_desc(user::Column::CreatedAt)
            .offset(offset)
            .limit(query.limit as u64)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let items = models.into_iter().map(model_to_domain).collect();
        Ok(PaginatedResult::new(items, total, query.page, query.limit))
    }

    async fn count(&self) -> DomainResult<u64> {
        user::Entity::find().count(&self.db).await.map_err(db_err)
    }

    async fn save(&self, u: User) -> DomainResult<User> {
        let model = domain_to_active(u)
            .insert(&self.db)
            .await
            .map_err(|e| write_err(e, email_taken))?;
        info!("User saved: {} ({})", model.email, model.id);
        Ok(model_to_domain(model))
    }

    async fn update(&self, u: User) -> DomainResult<()> {
        let id = u.id.clone();
        domain_to_active(u)
            .update(&self.db)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => DomainError::not_found("User", "id", id),
                other => write_err(other, email_taken),
            })?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let result = user::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("User", "id", id));
        }
        info!("User deleted: {}", id);
        Ok(())
    }
}
