use std::io;

/// Buffer handed to `gethostname`, including room for the terminating NUL.
const HOSTNAME_BUF_LEN: usize = 256;

/// Returns the host's name exactly as the kernel reports it. Whether the
/// name is fully qualified depends on how the system is configured; use
/// [`hostname`] and [`domain_name`] for the split parts.
pub fn fqdn() -> io::Result<String> {
    let mut buf = [0u8; HOSTNAME_BUF_LEN];
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if ret != 0 {
        let err = io::Error::last_os_error();
        log::warn!("gethostname failed: {}", err);
        return Err(err);
    }
    // The kernel does not guarantee a NUL when the name fills the buffer.
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
}

/// Everything before the first dot, or the whole name when there is no dot.
pub fn hostname_from_fqdn(fqdn: &str) -> &str {
    match fqdn.split_once('.') {
        Some((host, _)) => host,
        None => fqdn,
    }
}

/// Everything after the first dot, or the empty string when there is no dot.
/// The dot itself is never part of the result.
pub fn domain_from_fqdn(fqdn: &str) -> &str {
    match fqdn.split_once('.') {
        Some((_, domain)) => domain,
        None => "",
    }
}

/// The unqualified host name.
pub fn hostname() -> io::Result<String> {
    Ok(hostname_from_fqdn(&fqdn()?).to_string())
}

/// The domain part of the host's name, empty when the name is unqualified.
pub fn domain_name() -> io::Result<String> {
    Ok(domain_from_fqdn(&fqdn()?).to_string())
}
