use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Cart is empty")]
    CartEmpty,

    #[error("No active delivery order")]
    NoActiveOrder,

    #[error("Order {id} has already been delivered")]
    OrderAlreadyDelivered { id: String },

    #[error("Invalid review: {reason}")]
    InvalidReview { reason: String },

    #[error("Review not found: {id}")]
    ReviewNotFound { id: String },

    #[error("Menu item not found: {id}")]
    MenuItemNotFound { id: String },

    #[error("Restaurant not found: {id}")]
    RestaurantNotFound { id: String },
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
