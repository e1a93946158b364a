mod jwt_issuer;

pub use jwt_issuer::JwtCredentialIssuer;
