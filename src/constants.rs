//! Well-known values shared between modules

/// Default HTTP port of the service handling [`Client`](crate::domain::SubjectKind::Client) searches
pub const PORT_CLIENT_SERVICE: u16 = 3001;

/// Default HTTP port of the service handling [`Companie`](crate::domain::SubjectKind::Companie) searches
pub const PORT_COMPANY_SERVICE: u16 = 3002;

/// Default HTTP port of the gateway
pub const PORT_GATEWAY: u16 = 8000;

/// Default HTTP port of the authentication service
pub const PORT_AUTH: u16 = 4500;
