//! User Entity Implementation
//!
//! `users` 컬렉션에 저장되는 사용자 엔티티입니다.
//! Google 계정은 `google_sub`(Google의 `sub` 클레임)로 식별되며,
//! 로컬 계정은 bcrypt 해시된 비밀번호를 가집니다.

use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::config::AuthProvider;
use crate::domain::models::oauth::GoogleIdentity;

pub const DEFAULT_ROLE: &str = "user";
pub const ADMIN_ROLE: &str = "admin";

const XP_PER_LEVEL: i64 = 100;
const MAX_LEVEL: i32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    pub auth_provider: AuthProvider,
    /// Google `sub`. 값이 있으면 Google 계정과 연결된 사용자
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub roles: Vec<String>,
    #[serde(default)]
    pub xp_points: i64,
    #[serde(default = "initial_level")]
    pub level: i32,
    #[serde(default)]
    pub games_played: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

fn initial_level() -> i32 {
    1
}

/// 누적 경험치에 해당하는 레벨 (1..=100)
pub fn level_for_xp(xp_points: i64) -> i32 {
    let level = (xp_points.max(0) / XP_PER_LEVEL + 1).min(MAX_LEVEL as i64);
    level as i32
}

impl User {
    /// 검증된 Google 신원으로 첫 로그인 사용자를 만듭니다.
    pub fn new_google(identity: &GoogleIdentity) -> Self {
        let now = DateTime::now();

        Self {
            id: None,
            email: identity.email.clone(),
            display_name: identity.name.clone(),
            profile_image_url: identity.picture.clone(),
            auth_provider: AuthProvider::Google,
            google_sub: Some(identity.subject.clone()),
            password_hash: None,
            is_active: true,
            is_email_verified: identity.email_verified,
            roles: vec![DEFAULT_ROLE.to_string()],
            xp_points: 0,
            level: 1,
            games_played: 0,
            last_login_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_local(email: String, display_name: Option<String>, password_hash: String) -> Self {
        let now = DateTime::now();

        Self {
            id: None,
            email,
            display_name,
            profile_image_url: None,
            auth_provider: AuthProvider::Local,
            google_sub: None,
            password_hash: Some(password_hash),
            is_active: true,
            is_email_verified: false,
            roles: vec![DEFAULT_ROLE.to_string()],
            xp_points: 0,
            level: 1,
            games_played: 0,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id_string(&self) -> Option<String> {
        self.id.map(|id| id.to_hex())
    }

    pub fn is_provider_linked(&self) -> bool {
        self.google_sub.is_some()
    }

    /// 로그인 시 Google 프로필 최신값을 반영합니다.
    ///
    /// Google이 값을 주지 않은 필드는 기존 값을 유지합니다.
    pub fn apply_google_login(&mut self, identity: &GoogleIdentity) {
        let now = DateTime::now();

        self.google_sub = Some(identity.subject.clone());
        if identity.name.is_some() {
            self.display_name = identity.name.clone();
        }
        if identity.picture.is_some() {
            self.profile_image_url = identity.picture.clone();
        }
        self.is_email_verified = self.is_email_verified || identity.email_verified;
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    pub fn add_xp(&mut self, amount: i64) {
        self.xp_points = self.xp_points.saturating_add(amount);
        self.level = level_for_xp(self.xp_points);
        self.updated_at = DateTime::now();
    }

    pub fn record_game_played(&mut self) {
        self.games_played = self.games_played.saturating_add(1);
        self.updated_at = DateTime::now();
    }
}
