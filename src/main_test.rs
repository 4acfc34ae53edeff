use super::*;
use clap::Parser;

#[test]
fn test_parse_convert_with_defaults() {
    let cli = Cli::try_parse_from(["acictl", "convert", "deploy.yaml"]).unwrap();

    match cli.command {
        Commands::Convert { file, region, os } => {
            assert_eq!(file, PathBuf::from("deploy.yaml"));
            assert!(region.is_none());
            assert!(os.is_none());
        }
        other => panic!("expected convert, got {other:?}"),
    }
    assert!(cli.config.is_none());
}

#[test]
fn test_parse_create_flags() {
    let cli = Cli::try_parse_from([
        "acictl",
        "create",
        "deploy.yaml",
        "-g",
        "my-rg",
        "--region",
        "westeurope",
        "--os",
        "Windows",
        "--config",
        "acictl.toml",
    ])
    .unwrap();

    assert_eq!(cli.config, Some(PathBuf::from("acictl.toml")));
    let overrides = cli.command.overrides();
    assert_eq!(overrides.resource_group.as_deref(), Some("my-rg"));
    assert_eq!(overrides.region.as_deref(), Some("westeurope"));
    assert_eq!(overrides.operating_system.as_deref(), Some("Windows"));
}

#[test]
fn test_parse_logs_with_tail() {
    let cli = Cli::try_parse_from([
        "acictl",
        "logs",
        "web-aB3cD",
        "web",
        "--resource-group",
        "rg",
        "--tail",
        "50",
    ])
    .unwrap();

    match cli.command {
        Commands::Logs {
            group,
            container,
            resource_group,
            tail,
        } => {
            assert_eq!(group, "web-aB3cD");
            assert_eq!(container, "web");
            assert_eq!(resource_group.as_deref(), Some("rg"));
            assert_eq!(tail, Some(50));
        }
        other => panic!("expected logs, got {other:?}"),
    }
}

#[test]
fn test_delete_overrides_only_resource_group() {
    let cli = Cli::try_parse_from(["acictl", "delete", "deploy.yaml", "-g", "rg"]).unwrap();

    let overrides = cli.command.overrides();
    assert_eq!(overrides.resource_group.as_deref(), Some("rg"));
    assert!(overrides.region.is_none());
    assert!(overrides.operating_system.is_none());
}

#[test]
fn test_parse_rejects_missing_file() {
    assert!(Cli::try_parse_from(["acictl", "convert"]).is_err());
    assert!(Cli::try_parse_from(["acictl", "delete"]).is_err());
}

#[test]
fn test_parse_rejects_non_numeric_tail() {
    let result = Cli::try_parse_from(["acictl", "logs", "g", "c", "--tail", "many"]);
    assert!(result.is_err());
}

#[test]
fn test_delete_matches_substring_unless_strict() {
    let cli = Cli::try_parse_from(["acictl", "delete", "deploy.yaml", "-g", "rg"]).unwrap();
    match cli.command {
        Commands::Delete { strict, .. } => assert_eq!(name_match(strict), NameMatch::Contains),
        other => panic!("expected delete, got {other:?}"),
    }

    let cli =
        Cli::try_parse_from(["acictl", "delete", "deploy.yaml", "-g", "rg", "--strict"]).unwrap();
    match cli.command {
        Commands::Delete { strict, .. } => assert_eq!(name_match(strict), NameMatch::Strict),
        other => panic!("expected delete, got {other:?}"),
    }
}

#[test]
fn test_list_strict_requires_file() {
    assert!(Cli::try_parse_from(["acictl", "list", "-g", "rg", "--strict"]).is_err());
    assert!(Cli::try_parse_from(["acictl", "list", "-g", "rg", "-f", "d.yaml", "--strict"]).is_ok());
}
