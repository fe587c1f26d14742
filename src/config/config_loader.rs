use anyhow::{Ok, Result};

use super::config_model::{AuthSecret, Billing, Database, DotEnvyConfig, Razorpay, Server};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .expect("SERVER_PORT is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let razorpay = Razorpay {
        api_base_url: std::env::var("RAZORPAY_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.razorpay.com".to_string()),
        key_id: std::env::var("RAZORPAY_KEY_ID").expect("RAZORPAY_KEY_ID is invalid"),
        key_secret: std::env::var("RAZORPAY_KEY_SECRET").expect("RAZORPAY_KEY_SECRET is invalid"),
    };

    let billing = Billing {
        currency: std::env::var("BILLING_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
        premium_level_threshold: std::env::var("PREMIUM_LEVEL_THRESHOLD")
            .expect("PREMIUM_LEVEL_THRESHOLD is invalid")
            .parse()?,
    };

    Ok(DotEnvyConfig {
        server,
        database,
        razorpay,
        billing,
    })
}

pub fn get_auth_secret() -> Result<AuthSecret> {
    dotenvy::dotenv().ok();

    Ok(AuthSecret {
        jwt_secret: std::env::var("JWT_USER_SECRET").expect("JWT_USER_SECRET is invalid"),
    })
}
