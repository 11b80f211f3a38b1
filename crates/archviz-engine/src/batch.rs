use std::thread;
use std::time::Duration;

use crate::credentials::Credential;
use crate::error::GenerationError;
use crate::gemini::{GeminiClient, ImageRequest};
use crate::media::ImageBytes;

/// Issues `quantity` identical image requests concurrently, request `i` delayed by
/// `stagger * i`. All-or-nothing: the first failure by index fails the batch. Results keep
/// submission order.
pub fn generate_batch(
    client: &GeminiClient,
    credential: &Credential,
    request: &ImageRequest,
    quantity: usize,
    stagger: Duration,
) -> Result<Vec<ImageBytes>, GenerationError> {
    if quantity == 0 {
        return Err(GenerationError::InvalidInput(
            "quantity must be at least 1".to_string(),
        ));
    }
    if quantity == 1 {
        return client.generate_image(credential, request).map(|image| vec![image]);
    }

    tracing::info!(quantity, stagger_ms = stagger.as_millis() as u64, "starting batch");
    let outcomes: Vec<Result<ImageBytes, GenerationError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..quantity)
            .map(|index| {
                scope.spawn(move || {
                    let delay = stagger.saturating_mul(index as u32);
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    client.generate_image(credential, request)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    Err(GenerationError::Transport(
                        "batch worker panicked".to_string(),
                    ))
                })
            })
            .collect()
    });

    outcomes.into_iter().collect()
}
