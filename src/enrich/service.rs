//! Port-to-service labeling.

/// Label for ports with no well-known service assignment.
pub const UNCOMMON_SERVICE: &str = "uncommon";

/// Maps a port to its well-known service name.
///
/// Total over `u16` and pure: every port maps to something, unlisted ports to
/// [`UNCOMMON_SERVICE`]. The table covers IANA assignments commonly abused as
/// C2 listener ports; an explicit table (rather than an OS services lookup)
/// keeps the output identical across hosts.
pub fn service_name(port: u16) -> &'static str {
    match port {
        20 => "ftp-data",
        21 => "ftp",
        22 => "ssh",
        23 => "telnet",
        25 => "smtp",
        53 => "domain",
        80 => "http",
        110 => "pop3",
        123 => "ntp",
        143 => "imap",
        179 => "bgp",
        443 => "https",
        445 => "microsoft-ds",
        465 => "smtps",
        587 => "submission",
        993 => "imaps",
        995 => "pop3s",
        1433 => "ms-sql-s",
        3306 => "mysql",
        3389 => "rdp",
        5432 => "postgresql",
        8080 => "http-alt",
        8443 => "https-alt",
        _ => UNCOMMON_SERVICE,
    }
}
