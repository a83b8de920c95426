//! Tenant context around a dispatch attempt
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use tracing::trace;

/// Hook for the host's tenant/session context.
///
/// `start_tenant_flow` runs before configuration is resolved and
/// `end_tenant_flow` runs once the attempt is over, whatever its outcome.
pub trait TenantFlow: Send + Sync {
    fn start_tenant_flow(&self);
    fn end_tenant_flow(&self);
}

/// Tenant flow for hosts without tenant context
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTenantFlow;

impl TenantFlow for NoopTenantFlow {
    fn start_tenant_flow(&self) {}
    fn end_tenant_flow(&self) {}
}

/// Ends the tenant flow when dropped
pub struct TenantFlowGuard<'a> {
    flow: &'a dyn TenantFlow,
}

impl<'a> TenantFlowGuard<'a> {
    pub fn enter(flow: &'a dyn TenantFlow) -> Self {
        trace!("Starting tenant flow");
        flow.start_tenant_flow();
        Self { flow }
    }
}

impl Drop for TenantFlowGuard<'_> {
    fn drop(&mut self) {
        self.flow.end_tenant_flow();
        trace!("Tenant flow ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[derive(Default)]
    struct DepthFlow {
        depth: AtomicI32,
    }

    impl TenantFlow for DepthFlow {
        fn start_tenant_flow(&self) {
            self.depth.fetch_add(1, Ordering::SeqCst);
        }

        fn end_tenant_flow(&self) {
            self.depth.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn fallible(flow: &DepthFlow, fail: bool) -> Result<(), String> {
        let _guard = TenantFlowGuard::enter(flow);
        assert_eq!(flow.depth.load(Ordering::SeqCst), 1);
        if fail {
            return Err("boom".to_string());
        }
        Ok(())
    }

    #[test]
    fn test_guard_ends_flow_on_success_and_error() {
        let flow = DepthFlow::default();

        fallible(&flow, false).unwrap();
        assert_eq!(flow.depth.load(Ordering::SeqCst), 0);

        fallible(&flow, true).unwrap_err();
        assert_eq!(flow.depth.load(Ordering::SeqCst), 0);
    }
}
