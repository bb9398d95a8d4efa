use git_changelog::boundary::BoundaryWarning;
use git_changelog::ui;

// ============================================================================
// BoundaryWarning Display Tests
// ============================================================================

#[test]
fn test_boundary_warning_remote_not_found_display() {
    let warning = BoundaryWarning::RemoteNotFound {
        remote: "upstream".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("'upstream'"),
        "Message should name the remote, got: {}",
        display_msg
    );
    assert!(
        display_msg.contains("no links"),
        "Message should explain the consequence, got: {}",
        display_msg
    );
}

#[test]
fn test_boundary_warning_no_version_tags_display() {
    assert_eq!(
        BoundaryWarning::NoVersionTags.to_string(),
        "No version tags found"
    );
}

#[test]
fn test_boundary_warning_equality() {
    let a = BoundaryWarning::RemoteNotFound {
        remote: "origin".to_string(),
    };
    let b = BoundaryWarning::RemoteNotFound {
        remote: "origin".to_string(),
    };
    assert_eq!(a, b);
    assert_ne!(a, BoundaryWarning::NoVersionTags);
}

// ============================================================================
// UI Display Tests
// ============================================================================

#[test]
fn test_display_boundary_warning_does_not_panic() {
    ui::display_boundary_warning(&BoundaryWarning::NoVersionTags);
    ui::display_boundary_warning(&BoundaryWarning::RemoteNotFound {
        remote: "origin".to_string(),
    });
}

#[test]
fn test_reporter_quiet_mode() {
    let reporter = ui::Reporter::new(true);
    assert!(reporter.is_quiet());
    reporter.status("hidden");
    reporter.success("hidden");
    assert!(!ui::Reporter::default().is_quiet());
}
