use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use axum::{Router, routing::MethodRouter};

use crate::{logging::panic_message, state::AppState};

pub mod classify;

pub type AppRouter = Router<Arc<AppState>>;
pub type RegisterFn = fn(&mut ModuleScope) -> anyhow::Result<()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Table,
    Lambda,
}

impl ModuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Table => "table",
            ModuleKind::Lambda => "lambda",
        }
    }
}

/// One row of the build-time module table.
#[derive(Clone, Copy)]
pub struct ModuleEntry {
    pub path: &'static str,
    pub kind: ModuleKind,
    pub register: RegisterFn,
}

impl std::fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// What a module's `register` sees: its own router plus the API prefix.
/// Routes only reach the app once `register` has returned `Ok`.
pub struct ModuleScope {
    api_prefix: String,
    router: AppRouter,
}

impl ModuleScope {
    pub fn new(api_prefix: impl Into<String>) -> Self {
        Self {
            api_prefix: api_prefix.into(),
            router: Router::new(),
        }
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    pub fn api_path(&self, path: &str) -> String {
        format!("{}{}", self.api_prefix, path)
    }

    /// Adds a route under the API prefix.
    pub fn route(&mut self, path: &str, method_router: MethodRouter<Arc<AppState>>) -> &mut Self {
        let full = self.api_path(path);
        self.router = std::mem::take(&mut self.router).route(&full, method_router);
        self
    }

    /// Merges a router whose paths are already absolute.
    pub fn mount(&mut self, router: AppRouter) -> &mut Self {
        self.router = std::mem::take(&mut self.router).merge(router);
        self
    }

    pub fn into_router(self) -> AppRouter {
        self.router
    }
}

#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub path: &'static str,
    pub kind: ModuleKind,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<&'static str>,
    pub failed: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Calls every entry's `register` once, in table order. A module that errors
/// or panics (route conflicts panic on merge) is recorded and skipped; the
/// router keeps whatever the earlier modules added.
pub fn load_modules(
    entries: &[ModuleEntry],
    api_prefix: &str,
    mut router: AppRouter,
) -> (AppRouter, LoadReport) {
    let mut report = LoadReport::default();

    for entry in entries {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut scope = ModuleScope::new(api_prefix);
            (entry.register)(&mut scope)?;
            Ok::<_, anyhow::Error>(router.clone().merge(scope.into_router()))
        }));

        let reason = match attempt {
            Ok(Ok(merged)) => {
                router = merged;
                report.loaded.push(entry.path);
                tracing::debug!(module = entry.path, kind = entry.kind.as_str(), "module registered");
                continue;
            }
            Ok(Err(err)) => format!("{err:#}"),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };

        tracing::error!(
            module = entry.path,
            kind = entry.kind.as_str(),
            %reason,
            "module registration failed"
        );
        report.failed.push(LoadFailure {
            path: entry.path,
            kind: entry.kind,
            reason,
        });
    }

    tracing::info!(
        loaded = report.loaded.len(),
        failed = report.failed.len(),
        "module loading finished"
    );
    (router, report)
}
