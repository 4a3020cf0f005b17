/// Names the current thread, visible in `top -H` and debuggers.
#[cfg(target_os = "linux")]
pub fn set_name(name: &str) {
    // linux limits thread names to 15 bytes plus nul
    let mut buf = [0u8; 16];
    let len = std::cmp::min(name.len(), 15);
    buf[..len].copy_from_slice(&name.as_bytes()[..len]);

    let ret = unsafe {
        libc::pthread_setname_np(libc::pthread_self(), buf.as_ptr().cast())
    };

    if ret != 0 {
        tracing::debug!(name, ret, "failed to set thread name");
    }
}

#[cfg(not(target_os = "linux"))]
pub fn set_name(_name: &str) {}

/// Best effort: needs CAP_SYS_NICE or an rtprio limit, carries on at normal
/// priority otherwise.
#[cfg(target_os = "linux")]
pub fn set_realtime_priority() {
    let mut param: libc::sched_param = unsafe { std::mem::zeroed() };
    param.sched_priority = 50;

    let ret = unsafe {
        libc::sched_setscheduler(0, libc::SCHED_FIFO, &param)
    };

    if ret != 0 {
        let err = std::io::Error::last_os_error();
        tracing::debug!(%err, "could not set realtime priority");
    }
}

#[cfg(not(target_os = "linux"))]
pub fn set_realtime_priority() {}
