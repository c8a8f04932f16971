//! Test doubles shared across module tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::data::reader::{PageReader, PageRequest, PageText, ScrapeError};

/// Replays canned pages in order; times out once the script runs dry.
pub struct ScriptedReader {
    pages: Mutex<VecDeque<PageText>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedReader {
    pub fn new(pages: Vec<PageText>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_total(total: &str) -> Self {
        Self::new(vec![page(total, 1)])
    }

    pub fn with_totals(totals: &[&str]) -> Self {
        Self::new(totals.iter().map(|t| page(t, 1)).collect())
    }

    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageReader for ScriptedReader {
    async fn read(&self, request: &PageRequest) -> Result<PageText, ScrapeError> {
        self.requests.lock().unwrap().push(request.clone());
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ScrapeError::Timeout(Duration::from_secs(30)))
    }
}

/// A page with `rows` identical outcome rows and the given total label.
pub fn page(total: &str, rows: usize) -> PageText {
    let row = ["16°C", "45%", "46¢", "55¢", "+3%", "$12000", "Hot"]
        .iter()
        .map(|v| Some(v.to_string()))
        .collect::<Vec<_>>();

    PageText {
        rows: vec![row; rows],
        labels: vec![Some(total.to_string())],
    }
}
