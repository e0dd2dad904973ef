//! Communication protocols and their derived security predicates.

use serde::{Deserialize, Serialize};

use crate::enums::{impl_display, parse_named, UnknownEnumValue};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    #[default]
    UnknownProtocol,
    Http,
    Https,
    Ws,
    Wss,
    ReverseProxyWebProtocol,
    ReverseProxyWebProtocolEncrypted,
    Mqtt,
    Jdbc,
    JdbcEncrypted,
    Odbc,
    OdbcEncrypted,
    SqlAccessProtocol,
    SqlAccessProtocolEncrypted,
    NosqlAccessProtocol,
    NosqlAccessProtocolEncrypted,
    Binary,
    BinaryEncrypted,
    Text,
    TextEncrypted,
    Ssh,
    SshTunnel,
    Smtp,
    SmtpEncrypted,
    Pop3,
    Pop3Encrypted,
    Imap,
    ImapEncrypted,
    Ftp,
    Ftps,
    Sftp,
    Scp,
    Ldap,
    Ldaps,
    Jms,
    Nfs,
    Smb,
    SmbEncrypted,
    LocalFileAccess,
    Nrpe,
    Xmpp,
    Iiop,
    IiopEncrypted,
    Jrmp,
    JrmpEncrypted,
    InProcessLibraryCall,
    ContainerSpawning,
}

impl Protocol {
    pub const VALUES: [Self; 47] = [
        Self::UnknownProtocol,
        Self::Http,
        Self::Https,
        Self::Ws,
        Self::Wss,
        Self::ReverseProxyWebProtocol,
        Self::ReverseProxyWebProtocolEncrypted,
        Self::Mqtt,
        Self::Jdbc,
        Self::JdbcEncrypted,
        Self::Odbc,
        Self::OdbcEncrypted,
        Self::SqlAccessProtocol,
        Self::SqlAccessProtocolEncrypted,
        Self::NosqlAccessProtocol,
        Self::NosqlAccessProtocolEncrypted,
        Self::Binary,
        Self::BinaryEncrypted,
        Self::Text,
        Self::TextEncrypted,
        Self::Ssh,
        Self::SshTunnel,
        Self::Smtp,
        Self::SmtpEncrypted,
        Self::Pop3,
        Self::Pop3Encrypted,
        Self::Imap,
        Self::ImapEncrypted,
        Self::Ftp,
        Self::Ftps,
        Self::Sftp,
        Self::Scp,
        Self::Ldap,
        Self::Ldaps,
        Self::Jms,
        Self::Nfs,
        Self::Smb,
        Self::SmbEncrypted,
        Self::LocalFileAccess,
        Self::Nrpe,
        Self::Xmpp,
        Self::Iiop,
        Self::IiopEncrypted,
        Self::Jrmp,
        Self::JrmpEncrypted,
        Self::InProcessLibraryCall,
        Self::ContainerSpawning,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownProtocol => "unknown-protocol",
            Self::Http => "http",
            Self::Https => "https",
            Self::Ws => "ws",
            Self::Wss => "wss",
            Self::ReverseProxyWebProtocol => "reverse-proxy-web-protocol",
            Self::ReverseProxyWebProtocolEncrypted => "reverse-proxy-web-protocol-encrypted",
            Self::Mqtt => "mqtt",
            Self::Jdbc => "jdbc",
            Self::JdbcEncrypted => "jdbc-encrypted",
            Self::Odbc => "odbc",
            Self::OdbcEncrypted => "odbc-encrypted",
            Self::SqlAccessProtocol => "sql-access-protocol",
            Self::SqlAccessProtocolEncrypted => "sql-access-protocol-encrypted",
            Self::NosqlAccessProtocol => "nosql-access-protocol",
            Self::NosqlAccessProtocolEncrypted => "nosql-access-protocol-encrypted",
            Self::Binary => "binary",
            Self::BinaryEncrypted => "binary-encrypted",
            Self::Text => "text",
            Self::TextEncrypted => "text-encrypted",
            Self::Ssh => "ssh",
            Self::SshTunnel => "ssh-tunnel",
            Self::Smtp => "smtp",
            Self::SmtpEncrypted => "smtp-encrypted",
            Self::Pop3 => "pop3",
            Self::Pop3Encrypted => "pop3-encrypted",
            Self::Imap => "imap",
            Self::ImapEncrypted => "imap-encrypted",
            Self::Ftp => "ftp",
            Self::Ftps => "ftps",
            Self::Sftp => "sftp",
            Self::Scp => "scp",
            Self::Ldap => "ldap",
            Self::Ldaps => "ldaps",
            Self::Jms => "jms",
            Self::Nfs => "nfs",
            Self::Smb => "smb",
            Self::SmbEncrypted => "smb-encrypted",
            Self::LocalFileAccess => "local-file-access",
            Self::Nrpe => "nrpe",
            Self::Xmpp => "xmpp",
            Self::Iiop => "iiop",
            Self::IiopEncrypted => "iiop-encrypted",
            Self::Jrmp => "jrmp",
            Self::JrmpEncrypted => "jrmp-encrypted",
            Self::InProcessLibraryCall => "in-process-library-call",
            Self::ContainerSpawning => "container-spawning",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownEnumValue> {
        parse_named(&Self::VALUES, Self::as_str, value)
    }

    /// Communication that never leaves the host process/machine.
    pub const fn is_process_local(self) -> bool {
        matches!(
            self,
            Self::InProcessLibraryCall | Self::LocalFileAccess | Self::ContainerSpawning
        )
    }

    pub const fn is_encrypted(self) -> bool {
        matches!(
            self,
            Self::Https
                | Self::Wss
                | Self::JdbcEncrypted
                | Self::OdbcEncrypted
                | Self::NosqlAccessProtocolEncrypted
                | Self::SqlAccessProtocolEncrypted
                | Self::BinaryEncrypted
                | Self::TextEncrypted
                | Self::Ssh
                | Self::SshTunnel
                | Self::Ftps
                | Self::Sftp
                | Self::Scp
                | Self::Ldaps
                | Self::ReverseProxyWebProtocolEncrypted
                | Self::IiopEncrypted
                | Self::JrmpEncrypted
                | Self::SmbEncrypted
                | Self::SmtpEncrypted
                | Self::Pop3Encrypted
                | Self::ImapEncrypted
        )
    }

    /// With `lax` also HTTP(S) and unknown binary count, covering REST-based
    /// NoSQL datastores.
    pub const fn is_potential_database_access_protocol(self, lax: bool) -> bool {
        let strict = matches!(
            self,
            Self::Jdbc
                | Self::JdbcEncrypted
                | Self::Odbc
                | Self::OdbcEncrypted
                | Self::SqlAccessProtocol
                | Self::SqlAccessProtocolEncrypted
                | Self::NosqlAccessProtocol
                | Self::NosqlAccessProtocolEncrypted
        );
        if lax {
            strict
                || matches!(
                    self,
                    Self::Http | Self::Https | Self::Binary | Self::BinaryEncrypted
                )
        } else {
            strict
        }
    }

    pub const fn is_potential_web_access_protocol(self) -> bool {
        matches!(
            self,
            Self::Http
                | Self::Https
                | Self::Ws
                | Self::Wss
                | Self::ReverseProxyWebProtocol
                | Self::ReverseProxyWebProtocolEncrypted
        )
    }
}

impl_display!(Protocol);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_round_trip() {
        for protocol in Protocol::VALUES {
            assert_eq!(Protocol::parse(protocol.as_str()).unwrap(), protocol);
            let json = serde_json::to_string(&protocol).unwrap();
            assert_eq!(json, format!("\"{}\"", protocol.as_str()));
        }
    }

    #[test]
    fn database_protocol_predicate_lax_includes_web() {
        assert!(Protocol::Jdbc.is_potential_database_access_protocol(false));
        assert!(!Protocol::Https.is_potential_database_access_protocol(false));
        assert!(Protocol::Https.is_potential_database_access_protocol(true));
    }

    #[test]
    fn process_local_protocols_are_not_encrypted() {
        assert!(Protocol::LocalFileAccess.is_process_local());
        assert!(!Protocol::LocalFileAccess.is_encrypted());
        assert!(Protocol::Ssh.is_encrypted());
    }
}
