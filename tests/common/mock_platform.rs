//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use git_stack::error::{Error, Result};
use git_stack::platform::PlatformService;
use git_stack::types::{Platform, PlatformConfig, PullRequest};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Call record for `create_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrCall {
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: String,
}

/// Call record for `update_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePrCall {
    pub pr_number: u64,
    pub base: String,
    pub body: String,
}

/// Simple mock platform service for testing
///
/// Features:
/// - Auto-incrementing PR numbers, starting after any seeded PRs
/// - Call tracking for verification
/// - Configurable responses per branch
/// - Error injection for failure path testing
pub struct MockPlatformService {
    config: PlatformConfig,
    next_pr_number: AtomicU64,
    prs: Mutex<HashMap<String, PullRequest>>,
    // Call tracking
    find_pr_calls: Mutex<Vec<String>>,
    create_pr_calls: Mutex<Vec<CreatePrCall>>,
    update_pr_calls: Mutex<Vec<UpdatePrCall>>,
    // Error injection
    error_on_create_pr: Mutex<Option<String>>,
    error_on_create_for: Mutex<HashMap<String, String>>,
    error_on_update_pr: Mutex<Option<String>>,
    empty_url_on_create: Mutex<bool>,
}

impl Default for MockPlatformService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatformService {
    /// Mock for `test/repo` on github.com
    pub fn new() -> Self {
        Self::with_config(PlatformConfig {
            platform: Platform::GitHub,
            owner: "test".to_string(),
            repo: "repo".to_string(),
            host: None,
        })
    }

    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            next_pr_number: AtomicU64::new(1),
            prs: Mutex::new(HashMap::new()),
            find_pr_calls: Mutex::new(Vec::new()),
            create_pr_calls: Mutex::new(Vec::new()),
            update_pr_calls: Mutex::new(Vec::new()),
            error_on_create_pr: Mutex::new(None),
            error_on_create_for: Mutex::new(HashMap::new()),
            error_on_update_pr: Mutex::new(None),
            empty_url_on_create: Mutex::new(false),
        }
    }

    /// Seed an open PR, keyed by its head branch
    pub fn with_pr(self, pr: PullRequest) -> Self {
        let next = self.next_pr_number.load(Ordering::SeqCst).max(pr.number + 1);
        self.next_pr_number.store(next, Ordering::SeqCst);
        self.prs.lock().unwrap().insert(pr.head.clone(), pr);
        self
    }

    // === Error injection methods ===

    /// Make `create_pr` return an error
    pub fn fail_create_pr(&self, msg: &str) {
        *self.error_on_create_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_pr` return an error for one head branch only
    pub fn fail_create_pr_for(&self, head: &str, msg: &str) {
        self.error_on_create_for
            .lock()
            .unwrap()
            .insert(head.to_string(), msg.to_string());
    }

    /// Make `update_pr` return an error
    pub fn fail_update_pr(&self, msg: &str) {
        *self.error_on_update_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_pr` return a PR without a URL
    pub fn return_empty_url(&self) {
        *self.empty_url_on_create.lock().unwrap() = true;
    }

    // === Call verification methods ===

    /// Get all branches that `find_existing_pr` was called with
    pub fn get_find_pr_calls(&self) -> Vec<String> {
        self.find_pr_calls.lock().unwrap().clone()
    }

    /// Get all `create_pr` calls
    pub fn get_create_pr_calls(&self) -> Vec<CreatePrCall> {
        self.create_pr_calls.lock().unwrap().clone()
    }

    /// Get all `update_pr` calls
    pub fn get_update_pr_calls(&self) -> Vec<UpdatePrCall> {
        self.update_pr_calls.lock().unwrap().clone()
    }

    /// Total number of calls that write to the platform
    pub fn write_call_count(&self) -> usize {
        self.get_create_pr_calls().len() + self.get_update_pr_calls().len()
    }

    /// Current state of the PR for a head branch
    pub fn pr(&self, head: &str) -> Option<PullRequest> {
        self.prs.lock().unwrap().get(head).cloned()
    }

    /// Assert that `create_pr` was called with specific head and base
    pub fn assert_create_pr_called(&self, head: &str, base: &str) {
        let calls = self.get_create_pr_calls();
        assert!(
            calls.iter().any(|c| c.head == head && c.base == base),
            "Expected create_pr({head}, {base}) but got: {calls:?}"
        );
    }

    /// Assert that `update_pr` was called with a specific base
    pub fn assert_update_base_called(&self, pr_number: u64, base: &str) {
        let calls = self.get_update_pr_calls();
        assert!(
            calls
                .iter()
                .any(|c| c.pr_number == pr_number && c.base == base),
            "Expected update_pr({pr_number}, {base}) but got: {calls:?}"
        );
    }
}

/// Web URL of a mock PR
pub fn pr_url(number: u64) -> String {
    format!("https://github.com/test/repo/pull/{number}")
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn find_existing_pr(&self, head_branch: &str) -> Result<Option<PullRequest>> {
        self.find_pr_calls
            .lock()
            .unwrap()
            .push(head_branch.to_string());
        Ok(self.pr(head_branch))
    }

    async fn create_pr(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        self.create_pr_calls.lock().unwrap().push(CreatePrCall {
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });

        if let Some(msg) = self.error_on_create_pr.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        if let Some(msg) = self.error_on_create_for.lock().unwrap().get(head) {
            return Err(Error::Platform(msg.clone()));
        }

        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        let url = if *self.empty_url_on_create.lock().unwrap() {
            String::new()
        } else {
            pr_url(number)
        };
        let pr = PullRequest {
            number,
            url,
            title: title.to_string(),
            body: body.to_string(),
            base: base.to_string(),
            head: head.to_string(),
            commits: Vec::new(),
        };
        self.prs
            .lock()
            .unwrap()
            .insert(head.to_string(), pr.clone());
        Ok(pr)
    }

    async fn update_pr(&self, pr_number: u64, base: &str, body: &str) -> Result<PullRequest> {
        self.update_pr_calls.lock().unwrap().push(UpdatePrCall {
            pr_number,
            base: base.to_string(),
            body: body.to_string(),
        });

        if let Some(msg) = self.error_on_update_pr.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        let mut prs = self.prs.lock().unwrap();
        let pr = prs
            .values_mut()
            .find(|pr| pr.number == pr_number)
            .ok_or_else(|| Error::Platform(format!("no PR #{pr_number}")))?;
        pr.base = base.to_string();
        pr.body = body.to_string();
        Ok(pr.clone())
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
