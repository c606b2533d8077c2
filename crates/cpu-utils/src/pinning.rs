/*
 * Copyright 2024 Fluence Labs Limited
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use core_affinity::CoreId;

use crate::LogicalCoreId;

/// Lightweight function which doesn't require any saved state to pin current thread to the
/// specified core.
/// Returns true, if pinning was successful.
pub fn pin_current_thread_to(core_id: LogicalCoreId) -> bool {
    let core_id = CoreId { id: core_id.into() };
    core_affinity::set_for_current(core_id)
}

/// Returns logical cores the current thread is allowed to be pinned to.
pub fn allowed_cores() -> Vec<LogicalCoreId> {
    core_affinity::get_core_ids()
        .unwrap_or_default()
        .into_iter()
        .map(|core_id| LogicalCoreId::from(core_id.id as u32))
        .collect()
}

#[cfg(target_os = "linux")]
pub use linux::*;
#[cfg(not(target_os = "linux"))]
pub use other::*;

#[cfg(target_os = "linux")]
mod linux {
    use nix::sched::sched_getaffinity;
    use nix::sched::sched_setaffinity;
    use nix::sched::CpuSet;
    use nix::unistd::Pid;

    use crate::CPUPinningError;
    use crate::LogicalCoreId;
    use crate::PinningResult;

    // Pid 0 addresses the calling thread.
    const CURRENT_THREAD: i32 = 0;

    /// Pins the current thread to one logical core and restores the previous affinity
    /// mask when dropped.
    #[derive(Debug)]
    pub struct PinningGuard {
        core_id: LogicalCoreId,
        previous_affinity: CpuSet,
    }

    impl PinningGuard {
        pub fn pin(core_id: LogicalCoreId) -> PinningResult<Self> {
            let previous_affinity = sched_getaffinity(Pid::from_raw(CURRENT_THREAD))
                .map_err(CPUPinningError::get_affinity_failed)?;

            let mut affinity = CpuSet::new();
            affinity
                .set(core_id.into())
                .map_err(|_| CPUPinningError::logical_core_too_big(core_id, CpuSet::count()))?;
            sched_setaffinity(Pid::from_raw(CURRENT_THREAD), &affinity)
                .map_err(|errno| CPUPinningError::pin_failed(core_id, errno))?;

            tracing::debug!("current thread is pinned to logical core {core_id}");

            Ok(Self {
                core_id,
                previous_affinity,
            })
        }

        pub fn core_id(&self) -> LogicalCoreId {
            self.core_id
        }
    }

    impl Drop for PinningGuard {
        fn drop(&mut self) {
            if let Err(errno) =
                sched_setaffinity(Pid::from_raw(CURRENT_THREAD), &self.previous_affinity)
            {
                tracing::warn!(
                    "restoring affinity mask after logical core {} failed: {errno:?}",
                    self.core_id
                );
                return;
            }

            tracing::debug!(
                "current thread is released from logical core {}",
                self.core_id
            );
        }
    }

    /// Lets the current thread run on every core again, the kernel narrows the mask down
    /// to the cores that are online and allowed for the process.
    pub fn unpin_current_thread() -> PinningResult<()> {
        let mut affinity = CpuSet::new();
        for cpu in 0..CpuSet::count() {
            affinity.set(cpu).map_err(CPUPinningError::restore_failed)?;
        }

        sched_setaffinity(Pid::from_raw(CURRENT_THREAD), &affinity)
            .map_err(CPUPinningError::restore_failed)
    }

    pub fn current_affinity() -> PinningResult<CpuSet> {
        sched_getaffinity(Pid::from_raw(CURRENT_THREAD))
            .map_err(CPUPinningError::get_affinity_failed)
    }
}

#[cfg(not(target_os = "linux"))]
mod other {
    use crate::CPUPinningError;
    use crate::LogicalCoreId;
    use crate::PinningResult;

    /// Pins the current thread to one logical core, the previous mask can't be read back
    /// here, so dropping the guard leaves the thread pinned.
    #[derive(Debug)]
    pub struct PinningGuard {
        core_id: LogicalCoreId,
    }

    impl PinningGuard {
        pub fn pin(core_id: LogicalCoreId) -> PinningResult<Self> {
            if !super::pin_current_thread_to(core_id) {
                return Err(CPUPinningError::pin_rejected(core_id));
            }

            Ok(Self { core_id })
        }

        pub fn core_id(&self) -> LogicalCoreId {
            self.core_id
        }
    }

    pub fn unpin_current_thread() -> PinningResult<()> {
        Ok(())
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;
    use crate::CPUPinningError;

    fn first_allowed_core() -> LogicalCoreId {
        *allowed_cores()
            .first()
            .expect("test process should be allowed to run somewhere")
    }

    #[test]
    fn guard_pins_and_restores() {
        let before = current_affinity().unwrap();
        let core_id = first_allowed_core();

        {
            let guard = PinningGuard::pin(core_id).unwrap();
            assert_eq!(guard.core_id(), core_id);

            let pinned = current_affinity().unwrap();
            assert!(pinned.is_set(core_id.into()).unwrap());
            assert_eq!(allowed_cores(), vec![core_id]);
        }

        assert_eq!(current_affinity().unwrap(), before);
    }

    #[test]
    fn guard_rejects_too_big_core() {
        let core_id = LogicalCoreId::from(u32::MAX);
        let result = PinningGuard::pin(core_id);

        assert!(matches!(
            result,
            Err(CPUPinningError::LogicalCoreIdTooBig { .. })
        ));
    }

    #[test]
    fn pin_and_unpin_current_thread() {
        let core_id = first_allowed_core();
        let allowed_before = allowed_cores();

        assert!(pin_current_thread_to(core_id));
        assert_eq!(allowed_cores(), vec![core_id]);

        unpin_current_thread().unwrap();
        let allowed_after = allowed_cores();
        assert!(allowed_before
            .iter()
            .all(|core_id| allowed_after.contains(core_id)));
    }
}
