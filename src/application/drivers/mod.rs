//! Driver QR codes and public driver verification

pub mod qr_service;

pub use qr_service::{
    DriverQrCode, DriverQrConfig, DriverQrService, DriverVerification, DEFAULT_QR_WIDTH,
};
