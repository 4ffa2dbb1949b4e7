//! Security-focused logging module to track security events

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// Types of security events to track
#[derive(Debug, Clone)]
pub enum SecurityEvent {
    // Authentication events
    AuthenticationFailed { email: String, reason: String },
    AuthenticationSuccess { user_id: String },
    TokenValidationFailed { reason: String },

    // Authorization events
    PermissionDenied { user_id: String, action: String, resource: Option<String> },
    UnauthorizedAccess { resource: String },

    // Account administration
    AccountChanged { actor_id: String, target_id: String, change: String },
}

impl SecurityEvent {
    /// Counter key used for alert thresholds
    fn key(&self) -> &'static str {
        match self {
            SecurityEvent::AuthenticationFailed { .. } => "auth_failed",
            SecurityEvent::AuthenticationSuccess { .. } => "auth_success",
            SecurityEvent::TokenValidationFailed { .. } => "token_validation_failed",
            SecurityEvent::PermissionDenied { .. } => "permission_denied",
            SecurityEvent::UnauthorizedAccess { .. } => "unauthorized_access",
            SecurityEvent::AccountChanged { .. } => "account_changed",
        }
    }
}

/// Counts security events and raises an alert line when a type crosses its threshold
pub struct SecurityLogger {
    event_counts: Mutex<HashMap<&'static str, usize>>,
    alert_thresholds: HashMap<&'static str, usize>,
}

impl SecurityLogger {
    /// Create a new security logger
    pub fn new() -> Self {
        let mut alert_thresholds = HashMap::new();
        alert_thresholds.insert("auth_failed", 5);
        alert_thresholds.insert("token_validation_failed", 10);
        alert_thresholds.insert("permission_denied", 20);
        alert_thresholds.insert("unauthorized_access", 20);

        Self {
            event_counts: Mutex::new(HashMap::new()),
            alert_thresholds,
        }
    }

    /// Log a security event
    pub fn log_event(&self, event: SecurityEvent) {
        let key = event.key();

        // Update counters and check for alerts
        let alert_count = match self.event_counts.lock() {
            Ok(mut counts) => {
                let count = counts.entry(key).or_insert(0);
                *count += 1;
                match self.alert_thresholds.get(key) {
                    Some(&threshold) if *count >= threshold => {
                        let reached = *count;
                        *count = 0; // Reset counter after alert
                        Some(reached)
                    }
                    _ => None,
                }
            }
            Err(_) => None,
        };

        if let Some(count) = alert_count {
            log::error!("SECURITY ALERT: {} events of type '{}' detected", count, key);
        }

        match event {
            SecurityEvent::AuthenticationFailed { email, reason } => {
                log::warn!("SECURITY: Authentication failed - Email: {}, Reason: {}", email, reason);
            }
            SecurityEvent::AuthenticationSuccess { user_id } => {
                log::info!("SECURITY: Authentication success - User: {}", user_id);
            }
            SecurityEvent::TokenValidationFailed { reason } => {
                log::debug!("SECURITY: Token validation failed - Reason: {}", reason);
            }
            SecurityEvent::PermissionDenied { user_id, action, resource } => {
                log::warn!(
                    "SECURITY: Permission denied - User: {}, Action: {}, Resource: {:?}",
                    user_id, action, resource
                );
            }
            SecurityEvent::UnauthorizedAccess { resource } => {
                log::info!("SECURITY: Unauthenticated access attempt - Resource: {}", resource);
            }
            SecurityEvent::AccountChanged { actor_id, target_id, change } => {
                log::info!(
                    "SECURITY: Account changed - Actor: {}, Target: {}, Change: {}",
                    actor_id, target_id, change
                );
            }
        }
    }

    /// Snapshot of the counters since their last alert
    pub fn event_stats(&self) -> HashMap<&'static str, usize> {
        self.event_counts
            .lock()
            .map(|counts| counts.clone())
            .unwrap_or_default()
    }
}

impl Default for SecurityLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Global security logger instance - thread-safe singleton
static SECURITY_LOGGER: OnceLock<SecurityLogger> = OnceLock::new();

/// Get the global security logger
pub fn security_logger() -> &'static SecurityLogger {
    SECURITY_LOGGER.get_or_init(SecurityLogger::new)
}

/// Log a security event using the global logger
pub fn log_security_event(event: SecurityEvent) {
    security_logger().log_event(event);
}
