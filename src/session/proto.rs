//! # Wire protocol: control requests and payload dialects.
//!
//! Sessions accept two in-band payload dialects plus an out-of-band
//! control channel:
//!
//! - **Sentinel**: any byte feeds the dog; a `'V'` anywhere in the payload
//!   arms the magic-close confirmation.
//! - **Tagged**: the payload additionally carries `<field>value</field>`
//!   directives (rename, timeout, close flag, restart override, stop).
//! - **Control**: numeric requests mirroring the classic watchdog ioctl
//!   surface (support/status/keepalive/timeout).
//!
//! ## Rules
//! - Malformed or unrecognized tags are silently ignored; the bytes still
//!   count as a feed.
//! - `SET_TIMEOUT` without an argument is a transport fault, not an
//!   unsupported request.
//! - Unknown control codes fail with `NotSupported` and change nothing.

use crate::error::WdtError;

/// Sentinel byte that arms the magic-close confirmation.
pub const MAGIC_CHAR: u8 = b'V';

/// Raw control request codes (compatible with the classic watchdog ioctl
/// numbering).
pub mod cmd {
    /// Capability/identity descriptor.
    pub const GET_SUPPORT: u32 = 0;
    /// Current liveness as an integer code.
    pub const GET_STATUS: u32 = 1;
    /// Status at boot; this supervisor reports liveness here too.
    pub const GET_BOOT_STATUS: u32 = 2;
    /// Equivalent to a feed.
    pub const KEEP_ALIVE: u32 = 5;
    /// Validate and reprogram the timeout; replies with the new value.
    pub const SET_TIMEOUT: u32 = 6;
    /// Current timeout in seconds.
    pub const GET_TIMEOUT: u32 = 7;
}

/// Capability bits reported by [`SupportInfo::options`].
pub mod support {
    /// Timeout can be reprogrammed at runtime.
    pub const SET_TIMEOUT: u32 = 0x0080;
    /// Magic-close confirmation is honored.
    pub const MAGIC_CLOSE: u32 = 0x0100;
    /// Keep-alive pings are accepted.
    pub const KEEPALIVE_PING: u32 = 0x8000;

    /// Everything this supervisor implements.
    pub const ALL: u32 = SET_TIMEOUT | MAGIC_CLOSE | KEEPALIVE_PING;
}

/// Parsed control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    /// Capability/identity descriptor.
    GetSupport,
    /// Current liveness code.
    GetStatus,
    /// Boot-time status code.
    GetBootStatus,
    /// Feed the dog.
    KeepAlive,
    /// Validate and apply a new timeout (seconds).
    SetTimeout(i64),
    /// Current timeout.
    GetTimeout,
}

impl ControlRequest {
    /// Decodes a raw request code and optional integer argument.
    ///
    /// ```rust
    /// use softwdt::{ControlRequest, proto};
    ///
    /// let req = ControlRequest::from_raw(proto::cmd::SET_TIMEOUT, Some(30)).unwrap();
    /// assert_eq!(req, ControlRequest::SetTimeout(30));
    ///
    /// assert!(ControlRequest::from_raw(0x99, None).is_err());
    /// ```
    pub fn from_raw(code: u32, arg: Option<i64>) -> Result<Self, WdtError> {
        match code {
            cmd::GET_SUPPORT => Ok(ControlRequest::GetSupport),
            cmd::GET_STATUS => Ok(ControlRequest::GetStatus),
            cmd::GET_BOOT_STATUS => Ok(ControlRequest::GetBootStatus),
            cmd::KEEP_ALIVE => Ok(ControlRequest::KeepAlive),
            cmd::SET_TIMEOUT => match arg {
                Some(seconds) => Ok(ControlRequest::SetTimeout(seconds)),
                None => Err(WdtError::TransportFault(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "SET_TIMEOUT requires an integer argument",
                ))),
            },
            cmd::GET_TIMEOUT => Ok(ControlRequest::GetTimeout),
            other => Err(WdtError::NotSupported { cmd: other }),
        }
    }
}

/// Reply to a control request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlReply {
    /// Capability descriptor.
    Support(SupportInfo),
    /// Liveness code: `0` alive, `1` not.
    Status(u32),
    /// Timeout in seconds.
    Timeout(u16),
    /// Request performed, nothing to report.
    Ack,
}

/// Capability and identity descriptor returned by `GET_SUPPORT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportInfo {
    /// Capability bits, see [`support`].
    pub options: u32,
    /// Always `0`; there is no firmware behind this watchdog.
    pub firmware_version: u32,
    /// Dog name at the time of the request.
    pub identity: String,
}

impl SupportInfo {
    pub(crate) fn for_dog(identity: String) -> Self {
        Self {
            options: support::ALL,
            firmware_version: 0,
            identity,
        }
    }
}

/// One directive from the tagged payload dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Tag {
    /// `<name>…</name>`: set the display name (once).
    Name(String),
    /// `<timeout>…</timeout>`: reprogram the timeout.
    Timeout(i64),
    /// `<stop_on_fd_close>0|1</stop_on_fd_close>`: close confirmation flag.
    StopOnClose(bool),
    /// `<no_reboot>0|1</no_reboot>`: per-dog restart override.
    NoReboot(bool),
    /// `<stop_dog>1</stop_dog>`: stop immediately.
    StopDog,
}

/// Extracts recognized `<field>value</field>` directives from a payload.
///
/// Anything that does not parse as a complete, recognized directive is
/// skipped without complaint; feeding must never fail on decorative bytes.
pub(crate) fn parse_tags(data: &[u8]) -> Vec<Tag> {
    let text = String::from_utf8_lossy(data);
    let mut tags = Vec::new();
    let mut rest = text.as_ref();

    while let Some(open) = rest.find('<') {
        let after_open = &rest[open + 1..];
        let Some(name_end) = after_open.find('>') else {
            break;
        };
        let field = &after_open[..name_end];
        if field.is_empty() || field.starts_with('/') {
            rest = &after_open[name_end + 1..];
            continue;
        }

        let body_start = &after_open[name_end + 1..];
        let closing = format!("</{field}>");
        let Some(close) = body_start.find(&closing) else {
            // Unterminated directive: ignore the rest of the payload.
            rest = &after_open[name_end + 1..];
            continue;
        };
        let value = &body_start[..close];
        if let Some(tag) = decode_tag(field, value) {
            tags.push(tag);
        }
        rest = &body_start[close + closing.len()..];
    }
    tags
}

fn decode_tag(field: &str, value: &str) -> Option<Tag> {
    match field {
        "name" => Some(Tag::Name(value.to_string())),
        "timeout" => value.trim().parse::<i64>().ok().map(Tag::Timeout),
        "stop_on_fd_close" => decode_flag(value).map(Tag::StopOnClose),
        "no_reboot" => decode_flag(value).map(Tag::NoReboot),
        "stop_dog" => match value.trim() {
            "1" => Some(Tag::StopDog),
            _ => None,
        },
        _ => None,
    }
}

fn decode_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_decodes_known_codes() {
        assert_eq!(
            ControlRequest::from_raw(cmd::GET_SUPPORT, None).unwrap(),
            ControlRequest::GetSupport
        );
        assert_eq!(
            ControlRequest::from_raw(cmd::GET_STATUS, None).unwrap(),
            ControlRequest::GetStatus
        );
        assert_eq!(
            ControlRequest::from_raw(cmd::GET_BOOT_STATUS, None).unwrap(),
            ControlRequest::GetBootStatus
        );
        assert_eq!(
            ControlRequest::from_raw(cmd::KEEP_ALIVE, None).unwrap(),
            ControlRequest::KeepAlive
        );
        assert_eq!(
            ControlRequest::from_raw(cmd::SET_TIMEOUT, Some(-1)).unwrap(),
            ControlRequest::SetTimeout(-1)
        );
        assert_eq!(
            ControlRequest::from_raw(cmd::GET_TIMEOUT, None).unwrap(),
            ControlRequest::GetTimeout
        );
    }

    #[test]
    fn test_from_raw_rejects_unknown_codes() {
        for code in [3_u32, 4, 8, 0xdead] {
            match ControlRequest::from_raw(code, None) {
                Err(WdtError::NotSupported { cmd }) => assert_eq!(cmd, code),
                other => panic!("expected NotSupported for {code}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_set_timeout_without_argument_is_transport_fault() {
        let err = ControlRequest::from_raw(cmd::SET_TIMEOUT, None).expect_err("missing arg");
        assert!(matches!(err, WdtError::TransportFault(_)));
    }

    #[test]
    fn test_parse_tags_recognizes_every_field() {
        let payload = b"<name>pump-main</name><timeout>30</timeout>\
                        <stop_on_fd_close>1</stop_on_fd_close>\
                        <no_reboot>0</no_reboot><stop_dog>1</stop_dog>";
        let tags = parse_tags(payload);
        assert_eq!(
            tags,
            vec![
                Tag::Name("pump-main".to_string()),
                Tag::Timeout(30),
                Tag::StopOnClose(true),
                Tag::NoReboot(false),
                Tag::StopDog,
            ]
        );
    }

    #[test]
    fn test_parse_tags_ignores_malformed_input() {
        assert!(parse_tags(b"just a heartbeat").is_empty());
        assert!(parse_tags(b"<timeout>30").is_empty(), "unterminated tag");
        assert!(parse_tags(b"<timeout>abc</timeout>").is_empty());
        assert!(parse_tags(b"<unknown>1</unknown>").is_empty());
        assert!(parse_tags(b"<stop_dog>0</stop_dog>").is_empty());
        assert!(parse_tags(b"<>1</>").is_empty());
        assert!(parse_tags(b"<no_reboot>2</no_reboot>").is_empty());
    }

    #[test]
    fn test_parse_tags_survives_surrounding_noise() {
        let payload = b"feed feed <timeout> 15 </timeout> trailing<";
        assert_eq!(parse_tags(payload), vec![Tag::Timeout(15)]);
    }

    #[test]
    fn test_parse_tags_takes_directives_in_order() {
        let payload = b"<timeout>10</timeout><timeout>20</timeout>";
        assert_eq!(parse_tags(payload), vec![Tag::Timeout(10), Tag::Timeout(20)]);
    }

    #[test]
    fn test_support_info_reports_capabilities() {
        let info = SupportInfo::for_dog("wdt0".to_string());
        assert_eq!(info.options & support::SET_TIMEOUT, support::SET_TIMEOUT);
        assert_eq!(info.options & support::MAGIC_CLOSE, support::MAGIC_CLOSE);
        assert_eq!(info.options & support::KEEPALIVE_PING, support::KEEPALIVE_PING);
        assert_eq!(info.firmware_version, 0);
        assert_eq!(info.identity, "wdt0");
    }
}
