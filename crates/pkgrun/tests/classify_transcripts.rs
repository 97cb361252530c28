// Test module - relaxed lint rules
#![allow(clippy::indexing_slicing)]
#![allow(clippy::panic)]
#![allow(clippy::manual_assert)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::float_cmp)]
#![allow(missing_docs)]

//! Classifier tests against recorded tool transcripts.

use pkgrun::classify::{classify_transcript, find_regressions, OutputClassifier};
use pkgrun::config::{Locale, Messages};
use pkgrun::model::{CommandFamilies, CommandFamily};
use pkgrun_fixtures::transcripts;

fn fractions(families: CommandFamilies, lines: &[&str]) -> Vec<f64> {
    classify_transcript(families, Messages::default(), lines.iter().copied())
        .into_iter()
        .filter_map(|classified| classified.fraction)
        .collect()
}

#[test]
fn apt_english_install_fills_fetch_unpack_configure_phases() {
    let families = CommandFamilies::only(CommandFamily::Apt);
    assert_eq!(
        fractions(families, transcripts::APT_INSTALL_EN),
        vec![0.5, 0.5, 0.75, 0.75, 1.0, 1.0]
    );
}

#[test]
fn apt_english_install_derives_package_messages() {
    let classified = classify_transcript(
        CommandFamilies::only(CommandFamily::Apt),
        Messages::default(),
        transcripts::APT_INSTALL_EN.iter().copied(),
    );
    let messages: Vec<&str> = classified
        .iter()
        .filter_map(|line| line.message.as_deref())
        .collect();
    assert_eq!(
        messages,
        vec![
            "Unpacking hello...",
            "Unpacking cowsay...",
            "Configuring hello...",
            "Configuring cowsay...",
        ]
    );
}

#[test]
fn apt_estimates_total_from_summary_line() {
    let mut classifier =
        OutputClassifier::new(CommandFamilies::only(CommandFamily::Apt), Messages::default());
    for line in transcripts::APT_INSTALL_EN.iter().take(7) {
        classifier.classify(line);
    }
    assert_eq!(classifier.current_package_index(), 1);
    assert_eq!(classifier.estimated_total_packages(), 2);
}

#[test]
fn apt_spanish_install_uses_spanish_keywords() {
    let families = CommandFamilies::only(CommandFamily::Apt);
    assert_eq!(
        fractions(families, transcripts::APT_INSTALL_ES),
        vec![0.5, 0.75, 1.0]
    );

    let classified = classify_transcript(
        families,
        Messages::for_locale(Locale::Es),
        transcripts::APT_INSTALL_ES.iter().copied(),
    );
    let messages: Vec<&str> = classified
        .iter()
        .filter_map(|line| line.message.as_deref())
        .collect();
    assert_eq!(
        messages,
        vec!["Desempaquetando vlc-data...", "Configurando vlc-data..."]
    );
}

#[test]
fn dpkg_install_hits_fixed_checkpoints() {
    let families = CommandFamilies::only(CommandFamily::Dpkg);
    assert_eq!(
        fractions(families, transcripts::DPKG_INSTALL),
        vec![0.2, 0.5, 0.8]
    );
}

#[test]
fn wget_download_reads_percentages() {
    let families = CommandFamilies::only(CommandFamily::Wget);
    assert_eq!(
        fractions(families, transcripts::WGET_DOWNLOAD),
        vec![0.25, 0.5, 0.75, 1.0]
    );
}

#[test]
fn unzip_archive_hits_fixed_checkpoints() {
    let families = CommandFamilies::only(CommandFamily::Unzip);
    assert_eq!(
        fractions(families, transcripts::UNZIP_ARCHIVE),
        vec![0.5, 0.75, 0.75]
    );
}

#[test]
fn flatpak_percentages_may_go_backwards() {
    let families = CommandFamilies::only(CommandFamily::Flatpak);
    let values = fractions(families, transcripts::FLATPAK_INSTALL_ES);
    assert_eq!(values, vec![0.3, 1.0, 0.4, 1.0]);

    let regressions = find_regressions(values.into_iter().map(Some));
    assert_eq!(regressions.len(), 1);
    assert_eq!(regressions[0].index, 2);
    assert_eq!(regressions[0].previous, 1.0);
    assert_eq!(regressions[0].current, 0.4);
}

#[test]
fn classify_transcript_numbers_lines_and_skips_blank_ones() {
    let lines = ["", "Preparing to unpack x.deb ...", "   ", "Unpacking x (1) ..."];
    let classified = classify_transcript(
        CommandFamilies::only(CommandFamily::Dpkg),
        Messages::default(),
        lines,
    );
    assert_eq!(classified.len(), 2);
    assert_eq!(classified[0].line_number, 2);
    assert_eq!(classified[1].line_number, 4);
    assert_eq!(classified[1].family, Some(CommandFamily::Dpkg));
}

#[test]
fn wget_rule_takes_priority_over_dpkg() {
    let families: CommandFamilies = [CommandFamily::Dpkg, CommandFamily::Wget]
        .into_iter()
        .collect();
    let mut classifier = OutputClassifier::new(families, Messages::default());

    let class = classifier.classify("Setting up 30%");
    assert_eq!(class.family, Some(CommandFamily::Wget));
    assert_eq!(class.fraction, Some(0.3));

    let class = classifier.classify("Setting up foo (1.0) ...");
    assert_eq!(class.family, Some(CommandFamily::Dpkg));
    assert_eq!(class.fraction, Some(0.8));
}

#[test]
fn dpkg_rule_shadows_apt_for_shared_keywords() {
    let families: CommandFamilies = [CommandFamily::Apt, CommandFamily::Dpkg]
        .into_iter()
        .collect();
    let mut classifier = OutputClassifier::new(families, Messages::default());

    let class = classifier.classify("Unpacking foo (1.0) ...");
    assert_eq!(class.family, Some(CommandFamily::Dpkg));
    assert_eq!(class.fraction, Some(0.5));
    assert_eq!(class.message, None);
}

#[test]
fn no_family_forwards_raw_line_without_fraction() {
    let mut classifier = OutputClassifier::new(CommandFamilies::NONE, Messages::default());
    let update = classifier.update_for("Get:1 http://example.org pkg 50%");
    assert_eq!(update.message.as_deref(), Some("Get:1 http://example.org pkg 50%"));
    assert_eq!(update.fraction, None);
}

#[test]
fn update_for_prefers_derived_message() {
    let mut classifier =
        OutputClassifier::new(CommandFamilies::only(CommandFamily::Apt), Messages::default());
    let update = classifier.update_for("Setting up vlc (3.0) ...");
    assert_eq!(update.message.as_deref(), Some("Configuring vlc..."));
    assert_eq!(update.fraction, Some(0.75));
}
