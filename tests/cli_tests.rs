#![cfg(feature = "test-mock")]

#[cfg(test)]
mod tests {
    use clap::Parser;
    use notebridge::cli::{validate_device, Command};
    use notebridge::*;
    use std::path::PathBuf;

    #[test]
    fn test_device_list() {
        let devices = handle_device_list();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0], "Mock Device 1");
        assert_eq!(devices[1], "Mock Device 2");
    }

    #[test]
    fn test_devices_command() {
        let args = Args::parse_from(["test", "devices"]);
        assert_eq!(args.command, Command::Devices);
        assert_eq!(args.config, None);
    }

    #[test]
    fn test_send_notes_with_file_and_device() {
        let args = Args::parse_from([
            "test",
            "send-notes",
            "--file",
            "melody.txt",
            "--device",
            "Mock Device 1",
        ]);
        assert_eq!(
            args.command,
            Command::SendNotes {
                file: Some(PathBuf::from("melody.txt")),
                device: Some("Mock Device 1".to_string()),
                no_progress: false,
            }
        );
    }

    #[test]
    fn test_send_tempo_accepts_out_of_range_values() {
        let args = Args::parse_from(["test", "send-tempo", "-5"]);
        assert_eq!(
            args.command,
            Command::SendTempo {
                bpm: -5,
                device: None
            }
        );
    }

    #[test]
    fn test_global_config_flag() {
        let args = Args::parse_from(["test", "listen", "--config", "bridge.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("bridge.toml")));
        assert_eq!(
            args.command,
            Command::Listen {
                device: None,
                dump: None
            }
        );
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(Args::try_parse_from(["test"]).is_err());
    }

    #[test]
    fn test_valid_device_binding() {
        let devices = handle_device_list();
        assert!(validate_device("Mock Device 1", &devices).is_ok());
        // Substring match, as port names carry client prefixes
        assert!(validate_device("Device 2", &devices).is_ok());
    }

    #[test]
    fn test_invalid_device_binding() {
        let devices = handle_device_list();
        let error = validate_device("Nonexistent Device", &devices).unwrap_err();
        assert!(error.contains("Nonexistent Device"));
        assert!(error.contains("  - Mock Device 1"));
    }
}
