//! # LDAP Extended Operations
//!
//! Password Modify extended operation (RFC 3062) for xavyo LDAP provisioning.
//!
//! The crate builds the operation's request payload, interprets the server's
//! reply (success, referral, server-generated password) and classifies
//! failures. It runs either over any [`LdapTransport`] that can carry raw
//! LDAP messages, or over an `ldap3` connection via [`PasswordModifySession`].
//!
//! ## Example
//!
//! ```ignore
//! use xavyo_ldap_exop::{LdapSessionConfig, PasswordModifyRequest, PasswordModifySession};
//!
//! let config = LdapSessionConfig::new("ldap.example.com", "cn=admin,dc=example,dc=com")
//!     .with_password("secret")
//!     .with_ssl();
//!
//! let mut session = PasswordModifySession::connect(config).await?;
//! let request = PasswordModifyRequest::generate_for("uid=jdoe,ou=people,dc=example,dc=com");
//! let result = session.password_modify(&request).await?;
//! println!("new password: {:?}", result.generated_password);
//! ```

mod ber;
pub mod config;
pub mod error;
pub mod message;
pub mod request;
pub mod response;
pub mod result;
pub mod session;
pub mod transport;

// Re-exports
pub use config::LdapSessionConfig;
pub use error::{DirectoryError, ExopError, ExopResult};
pub use request::{PasswordModifyRequest, PASSWORD_MODIFY_OID};
pub use response::{decode, PasswordModifyResult, ResponseValue};
pub use result::{LdapResult, ResultCode};
pub use session::PasswordModifySession;
pub use transport::{password_modify, LdapTransport, PendingRequests, ResponseSlot};
