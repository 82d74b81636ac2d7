use crate::commands::runner::{run_standard_command, run_test_command};
use crate::commands::settings::Settings;
use crate::commands::snapshot::subdirectories;
use crate::error::{PipelineError, Result};
use crate::models::snapshot::{
    parse_snapshot_date, DESIGNITE_DIR, DV8_PROJECT_NAME, JACOCO_DIR, TEST_DATA_FILE,
};
use crate::models::test_summary::TestSummary;
use regex::Regex;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const POM_FILE: &str = "pom.xml";
const JACOCO_EXEC: &str = "target/jacoco.exec";

#[derive(Debug, Clone, Default)]
pub struct AnalyzeSummary {
    pub analyzed: Vec<PathBuf>,
    pub skipped: usize,
}

/// Run every external analysis tool over every snapshot under the snapshots
/// directory, writing results to `<results>/<project>/<date>/`.
pub async fn analyze_all(settings: &Settings) -> Result<AnalyzeSummary> {
    settings.require_tools()?;
    let projects = subdirectories(&settings.snapshots_directory)?;

    let mut summary = AnalyzeSummary::default();
    for project_dir in projects {
        let Some(project) = dir_name(&project_dir) else {
            continue;
        };
        let project_results = settings.results_directory.join(&project);
        fs::create_dir_all(&project_results).map_err(|e| PipelineError::io(e, &project_results))?;

        let snapshots = match subdirectories(&project_dir) {
            Ok(snapshots) => snapshots,
            Err(e) => {
                log::error!("Unable to access snapshots of {project}: {e}");
                continue;
            }
        };

        for snapshot in snapshots {
            match analyze_snapshot(settings, &project, &snapshot, &project_results).await {
                Ok(results) => summary.analyzed.push(results),
                Err(e) => {
                    log::error!("Could not analyze snapshot {}: {e}", snapshot.display());
                    summary.skipped += 1;
                }
            }
        }
    }

    Ok(summary)
}

/// Analyze one snapshot. Fails without running anything when its results
/// directory already exists.
pub async fn analyze_snapshot(
    settings: &Settings,
    project: &str,
    snapshot: &Path,
    project_results: &Path,
) -> Result<PathBuf> {
    let name = dir_name(snapshot).unwrap_or_default();
    if parse_snapshot_date(&name).is_none() {
        log::warn!("{project}: {} is not a dated snapshot", snapshot.display());
    }

    let results = project_results.join(&name);
    if results.exists() {
        return Err(PipelineError::SnapshotAnalyzed {
            project: project.to_string(),
            snapshot: name,
        });
    }
    fs::create_dir_all(&results).map_err(|e| PipelineError::io(e, &results))?;

    let snapshot = fs::canonicalize(snapshot).map_err(|e| PipelineError::io(e, snapshot))?;
    let results = fs::canonicalize(&results).map_err(|e| PipelineError::io(e, &results))?;
    log::info!("{project}: analyzing snapshot {name}");

    // Each tool runs even when an earlier one could not be started.
    if let Err(e) = run_designite(settings, &snapshot, &results).await {
        log::error!("{project}: Designite failed on {name}: {e}");
    }
    if let Err(e) = run_tests_with_coverage(settings, &snapshot, &results).await {
        log::error!("{project}: test and coverage step failed on {name}: {e}");
    }
    if let Err(e) = run_dv8(settings, &snapshot, &results).await {
        log::error!("{project}: DV8 failed on {name}: {e}");
    }

    Ok(results)
}

async fn run_designite(settings: &Settings, snapshot: &Path, results: &Path) -> Result<()> {
    let args: Vec<OsString> = vec![
        "-jar".into(),
        settings.designite_jar_path.clone().into(),
        "-i".into(),
        snapshot.into(),
        "-o".into(),
        results.join(DESIGNITE_DIR).into(),
        "-f".into(),
        "csv".into(),
    ];
    run_standard_command(&settings.java_command, &args, snapshot).await?;
    Ok(())
}

async fn run_tests_with_coverage(settings: &Settings, snapshot: &Path, results: &Path) -> Result<()> {
    let args = maven_test_args(&settings.jacoco_agent_path);
    match run_test_command(&settings.maven_command, &args, snapshot, settings.test_count_mode).await {
        Ok(summary) => write_test_data(&results.join(TEST_DATA_FILE), &summary)?,
        Err(e) => log::error!("Tests did not run in {}: {e}", snapshot.display()),
    }

    let reports = results.join(JACOCO_DIR);
    fs::create_dir_all(&reports).map_err(|e| PipelineError::io(e, &reports))?;

    for module in discover_modules(snapshot)? {
        let exec = module.join(JACOCO_EXEC);
        if !exec.is_file() {
            continue;
        }
        let Some(module_name) = dir_name(&module) else {
            continue;
        };
        let args: Vec<OsString> = vec![
            "-jar".into(),
            settings.jacoco_cli_path.clone().into(),
            "report".into(),
            exec.into(),
            "--classfiles".into(),
            module.join("target/classes").into(),
            "--sourcefiles".into(),
            module.join("src/main/java").into(),
            "--csv".into(),
            reports.join(format!("{module_name}.csv")).into(),
        ];
        if let Err(e) = run_standard_command(&settings.java_command, &args, &module).await {
            log::error!("Coverage report for {module_name} failed: {e}");
        }
    }

    Ok(())
}

async fn run_dv8(settings: &Settings, snapshot: &Path, results: &Path) -> Result<()> {
    let mut params = tempfile::Builder::new()
        .prefix("config")
        .suffix(".properties")
        .tempfile()
        .map_err(|e| PipelineError::io(e, std::env::temp_dir()))?;

    let properties = dv8_properties(snapshot, results);
    params
        .write_all(properties.as_bytes())
        .and_then(|_| params.flush())
        .map_err(|e| PipelineError::io(e, params.path()))?;

    let args: Vec<OsString> = vec!["arch-report".into(), "-paramsFile".into(), params.path().into()];
    let console = settings.dv8_console_path.to_string_lossy();
    run_standard_command(&console, &args, snapshot).await?;
    Ok(())
}

pub fn maven_test_args(jacoco_agent: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "clean",
        "test",
        "-DfailIfNoTests=false",
        "-Dsurefire.failIfNoSpecifiedTests=false",
        "-Dmaven.test.failure.ignore=true",
        "-Djacoco.skip=false",
        "-Djacoco.dataFile=target/jacoco.exec",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    let mut arg_line = OsString::from("-DargLine=-javaagent:");
    arg_line.push(jacoco_agent);
    arg_line.push("=destfile=target/jacoco.exec");
    args.push(arg_line);
    args
}

/// Parameters file for `dv8-console arch-report`, in Java properties syntax.
pub fn dv8_properties(snapshot: &Path, results: &Path) -> String {
    let entries = [
        ("outputFolder", results.to_string_lossy().into_owned()),
        ("projectName", DV8_PROJECT_NAME.to_string()),
        ("sourceType", "code".to_string()),
        ("sourceCodePath", snapshot.to_string_lossy().into_owned()),
        ("sourceCodeLanguage", "java".to_string()),
    ];

    let mut out = String::from("# codetrend arch-report parameters\n");
    for (key, value) in entries {
        out.push_str(key);
        out.push('=');
        out.push_str(&escape_property(&value));
        out.push('\n');
    }
    out
}

fn escape_property(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ':' | '=' | '#' | '!' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' ' if i == 0 => escaped.push_str("\\ "),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Maven modules under `root`, the root project first, then every `<module>`
/// of each `pom.xml`, recursively. Declared modules whose directory does not
/// exist are skipped.
pub fn discover_modules(root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = Regex::new(r"<module>\s*([^<]+?)\s*</module>")?;
    let mut modules = vec![root.to_path_buf()];
    collect_modules(root, &pattern, &mut modules);
    Ok(modules)
}

fn collect_modules(dir: &Path, pattern: &Regex, modules: &mut Vec<PathBuf>) {
    let pom = dir.join(POM_FILE);
    let Ok(content) = fs::read_to_string(&pom) else {
        return;
    };

    for caps in pattern.captures_iter(&content) {
        let module = dir.join(&caps[1]);
        if !module.is_dir() {
            log::warn!("Module {} declared in {} does not exist", &caps[1], pom.display());
            continue;
        }
        if modules.contains(&module) {
            continue;
        }
        modules.push(module.clone());
        collect_modules(&module, pattern, modules);
    }
}

pub fn write_test_data(path: &Path, summary: &TestSummary) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| PipelineError::csv(e, path))?;
    writer.serialize(summary).map_err(|e| PipelineError::csv(e, path))?;
    writer.flush().map_err(|e| PipelineError::io(e, path))?;
    Ok(())
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}
