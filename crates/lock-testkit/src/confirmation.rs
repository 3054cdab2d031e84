//! Scripted answers to key offers

use async_trait::async_trait;
use lock_authorization::{KeyConfirmation, KeyOffer};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Answers offers from a queue; an empty queue declines
#[derive(Default)]
pub struct ScriptedConfirmation {
    answers: Mutex<VecDeque<bool>>,
    offers: Mutex<Vec<KeyOffer>>,
}

impl ScriptedConfirmation {
    /// Answer the next offers with `answers`, in order
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            offers: Mutex::new(Vec::new()),
        }
    }

    /// Every offer seen so far, in order
    pub fn offers(&self) -> Vec<KeyOffer> {
        self.offers.lock().clone()
    }
}

#[async_trait]
impl KeyConfirmation for ScriptedConfirmation {
    async fn confirm(&self, offer: &KeyOffer) -> bool {
        self.offers.lock().push(offer.clone());
        self.answers.lock().pop_front().unwrap_or(false)
    }
}
