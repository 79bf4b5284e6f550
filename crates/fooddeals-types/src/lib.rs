//! Wire types shared by the FoodDeals client crates.

pub mod auth;
pub mod posts;
pub mod vision;

pub use auth::{AuthResponse, StatusResponse, UserProfile};
pub use posts::{Comment, LikeReceipt, Post, PostWithComments, SortMode};
pub use vision::{BatchPredictions, Prediction, PredictionResult, UploadReceipt};
