//! Profile photo for templates that show one.

use std::sync::{Arc, Mutex, MutexGuard};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use thiserror::Error;

use crate::export::{AssetCleanup, PhotoOffset, PhotoOverlay};

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhotoError {
    #[error("Image too large. Max 5MB.")]
    TooLarge { bytes: usize },

    #[error("Profile photo must be an image")]
    NotAnImage(String),

    #[error("Profile photo is not a valid data URL")]
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePhoto {
    pub data_url: String,
    pub mime_type: String,
    pub bytes: usize,
    pub offset: PhotoOffset,
}

impl ProfilePhoto {
    /// Validates a `data:image/...;base64,...` URL.
    pub fn from_data_url(data_url: &str) -> Result<Self, PhotoError> {
        let rest = data_url.strip_prefix("data:").ok_or(PhotoError::Malformed)?;
        let (mime_type, payload) = rest.split_once(";base64,").ok_or(PhotoError::Malformed)?;
        if !mime_type.starts_with("image/") {
            return Err(PhotoError::NotAnImage(mime_type.to_string()));
        }
        // Cheap upper bound before decoding anything large.
        if payload.len() / 4 * 3 > MAX_PHOTO_BYTES + 3 {
            return Err(PhotoError::TooLarge {
                bytes: payload.len() / 4 * 3,
            });
        }
        let bytes = STANDARD.decode(payload).map_err(|_| PhotoError::Malformed)?.len();
        if bytes > MAX_PHOTO_BYTES {
            return Err(PhotoError::TooLarge { bytes });
        }
        Ok(Self {
            data_url: data_url.to_string(),
            mime_type: mime_type.to_string(),
            bytes,
            offset: PhotoOffset::default(),
        })
    }

    pub fn overlay(&self) -> PhotoOverlay {
        PhotoOverlay {
            data_url: self.data_url.clone(),
            offset: self.offset,
        }
    }
}

/// Shared slot holding the session's photo. The export pipeline clears it
/// on a timer, so it lives outside the session lock.
#[derive(Debug, Clone, Default)]
pub struct PhotoSlot(Arc<Mutex<Option<ProfilePhoto>>>);

impl PhotoSlot {
    fn lock(&self) -> MutexGuard<'_, Option<ProfilePhoto>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn get(&self) -> Option<ProfilePhoto> {
        self.lock().clone()
    }

    pub fn set(&self, photo: ProfilePhoto) {
        *self.lock() = Some(photo);
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    /// Returns false when there is no photo to move.
    pub fn move_to(&self, offset: PhotoOffset) -> bool {
        match self.lock().as_mut() {
            Some(photo) => {
                photo.offset = offset;
                true
            }
            None => false,
        }
    }
}

impl AssetCleanup for PhotoSlot {
    fn clear_assets(&self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_url(mime: &str, bytes: usize) -> String {
        format!("data:{mime};base64,{}", STANDARD.encode(vec![7u8; bytes]))
    }

    #[test]
    fn test_accepts_small_image() {
        let photo = ProfilePhoto::from_data_url(&data_url("image/png", 1024)).unwrap();
        assert_eq!(photo.mime_type, "image/png");
        assert_eq!(photo.bytes, 1024);
        assert_eq!(photo.offset, PhotoOffset::default());
    }

    #[test]
    fn test_rejects_oversized_image() {
        let err = ProfilePhoto::from_data_url(&data_url("image/jpeg", MAX_PHOTO_BYTES + 1)).unwrap_err();
        assert!(matches!(err, PhotoError::TooLarge { .. }));
        assert_eq!(err.to_string(), "Image too large. Max 5MB.");
    }

    #[test]
    fn test_rejects_non_images_and_garbage() {
        assert!(matches!(
            ProfilePhoto::from_data_url(&data_url("application/pdf", 10)),
            Err(PhotoError::NotAnImage(_))
        ));
        assert_eq!(
            ProfilePhoto::from_data_url("https://example.com/me.png"),
            Err(PhotoError::Malformed)
        );
        assert_eq!(
            ProfilePhoto::from_data_url("data:image/png;base64,@@@"),
            Err(PhotoError::Malformed)
        );
    }

    #[test]
    fn test_slot_moves_and_clears() {
        let slot = PhotoSlot::default();
        assert!(!slot.move_to(PhotoOffset { x: 1.0, y: 1.0 }));
        slot.set(ProfilePhoto::from_data_url(&data_url("image/png", 8)).unwrap());
        assert!(slot.move_to(PhotoOffset { x: 10.0, y: -2.0 }));
        assert_eq!(slot.get().unwrap().overlay().offset, PhotoOffset { x: 10.0, y: -2.0 });

        let shared = slot.clone();
        shared.clear_assets();
        assert!(slot.get().is_none());
    }
}
