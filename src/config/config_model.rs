#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub razorpay: Razorpay,
    pub billing: Billing,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

/// The key secret signs payment callbacks and authenticates API calls; it
/// must never appear in logs or client-facing responses.
#[derive(Debug, Clone)]
pub struct Razorpay {
    pub api_base_url: String,
    pub key_id: String,
    pub key_secret: String,
}

#[derive(Debug, Clone)]
pub struct Billing {
    pub currency: String,
    pub premium_level_threshold: i32,
}

#[derive(Debug, Clone)]
pub struct AuthSecret {
    pub jwt_secret: String,
}
