pub mod chat;
pub mod lead;
pub mod otp;
pub mod quiz;

pub use chat::{ChatHistoryEntry, ChatHistoryRecord, ChatRequest, ChatResponse};
pub use lead::{
    OwnerRegistrationRecord, OwnerRegistrationRequest, OwnerRegistrationResponse, PropertyData,
    PropertyListing, SubmitResponse,
};
pub use otp::{OtpSendRequest, OtpVerifyRequest};
pub use quiz::{ActionButton, Question, QuizState};
