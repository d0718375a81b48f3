//! Listener settings and the assembled server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use actix_web::cookie::{Key, SameSite};
use cks_backend::outbound::persistence::DbPool;
use cks_backend::settings::{IdentitySettings, SessionSettings};
use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_PORT: u16 = 8080;

/// Listener settings loaded from `CKS_*` variables and command-line flags.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CKS")]
pub struct ListenerSettings {
    /// Address to bind, `0.0.0.0` when unset.
    pub host: Option<IpAddr>,
    /// Port to bind, 8080 when unset.
    pub port: Option<u16>,
    /// Apply pending migrations before serving.
    #[ortho_config(default = true)]
    pub run_migrations: bool,
}

impl ListenerSettings {
    /// Socket address the server binds to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(
            self.host.unwrap_or(DEFAULT_HOST),
            self.port.unwrap_or(DEFAULT_PORT),
        )
    }
}

/// Everything [`super::create_server`] needs.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) identity: IdentitySettings,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Combine session and identity settings with the bind address.
    #[must_use]
    pub fn new(session: SessionSettings, identity: IdentitySettings, bind_addr: SocketAddr) -> Self {
        let SessionSettings {
            key,
            cookie_secure,
            same_site,
        } = session;
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            identity,
            db_pool: None,
        }
    }

    /// Attach a database pool so persistence-backed ports are used.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}
