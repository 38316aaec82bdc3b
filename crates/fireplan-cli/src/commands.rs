use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{info, warn};

use fireplan::config::default_config_path;
use fireplan::pipeline::PipelineConfig;
use fireplan::request::parse_date;
use fireplan::{
    load_config, ComputeProvider, Config, DeliverableCatalog, DryRunProvider, ExportJob,
    FireWindows, FireplanError, JobHandle, JobState, LogNotifier, MonitorError, Notification,
    Notifier, Pipeline, PipelineError, PresetReport, PresetRunner, Region, Request, RunReport,
    Settings, TaskEvent, TaskMonitor, TracingProgress,
};

use crate::cli::{MonitorArgs, RunArgs};

/// Exit code for a monitored job that did not complete.
pub const EXIT_NOT_COMPLETED: u8 = 2;

/// Loads the configuration from `path`, or from the default location when it
/// exists, falling back to built-in defaults.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, FireplanError> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => match default_config_path() {
            Ok(path) if path.exists() => {
                info!("Using configuration {:?}", path);
                load_config(&path)?
            }
            _ => Config::default(),
        },
    };
    Settings::from_config(&config)
}

fn provider(settings: &Settings, dry_run: bool) -> Result<Arc<dyn ComputeProvider>, FireplanError> {
    if dry_run {
        return Ok(Arc::new(DryRunProvider::new()));
    }
    Ok(Arc::new(settings.http_provider()?))
}

/// Handles currently being watched, printed if the user interrupts.
#[derive(Clone, Default)]
pub struct WatchList(Arc<Mutex<Vec<JobHandle>>>);

impl WatchList {
    fn watch<'a>(&self, handles: impl IntoIterator<Item = &'a JobHandle>) {
        if let Ok(mut list) = self.0.lock() {
            list.extend(handles.into_iter().cloned());
        }
    }

    /// Prints every watched handle so monitoring can be resumed later.
    pub fn report_interrupted(&self) {
        let Ok(list) = self.0.lock() else {
            return;
        };
        for handle in list.iter() {
            println!("{}\tINTERRUPTED", handle);
        }
        eprintln!(
            "Stopped monitoring; remote jobs keep running. Resume with `fireplan monitor --job <handle>`."
        );
    }
}

fn print_state_change(event: &TaskEvent) {
    if let TaskEvent::StateChanged {
        handle,
        label,
        from,
        to,
        detail,
        ..
    } = event
    {
        match detail {
            Some(detail) => println!("{}\t{}\t{} -> {}\t{}", handle, label, from, to, detail),
            None => println!("{}\t{}\t{} -> {}", handle, label, from, to),
        }
    }
}

fn print_outcome(job: &ExportJob, outcome: &Result<JobState, MonitorError>) {
    match outcome {
        Ok(state) => println!("{}\t{}\t{}", job.handle, job.deliverable, state),
        Err(e) => println!("{}\t{}\t{}\t{}", job.handle, job.deliverable, job.state(), e),
    }
}

pub async fn run(
    args: RunArgs,
    config: Option<&Path>,
    watch: &WatchList,
) -> Result<ExitCode, FireplanError> {
    let settings = load_settings(config)?;
    let provider = provider(&settings, args.dry_run)?;
    let catalog = Arc::new(DeliverableCatalog::standard()?);
    let pipeline = Arc::new(Pipeline::new(
        catalog,
        provider.clone(),
        Arc::new(PipelineConfig::from_settings(&settings)),
    ));

    let (reports, mut failed) = match args.preset {
        Some(ref name) => run_preset(&settings, pipeline, name).await?,
        None => run_single(&settings, &pipeline, &args).await?,
    };

    if args.wait {
        let jobs: Vec<ExportJob> = reports.into_iter().flat_map(|r| r.jobs).collect();
        if !jobs.is_empty() {
            let monitor = TaskMonitor::new(provider, settings.monitor)?;
            watch.watch(jobs.iter().map(|job| &job.handle));
            let observer = |event: &TaskEvent| print_state_change(event);
            for (job, outcome) in monitor.monitor_many(jobs, &observer).await {
                print_outcome(&job, &outcome);
                failed |= outcome.is_err();
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn run_single(
    settings: &Settings,
    pipeline: &Pipeline,
    args: &RunArgs,
) -> Result<(Vec<RunReport>, bool), FireplanError> {
    let (Some(region), Some(start), Some(end)) = (&args.region, &args.start_date, &args.end_date)
    else {
        return Err(fireplan::InputError::MissingArgument(
            "--region, --start-date and --end-date".to_string(),
        )
        .into());
    };

    let region = Region::from_file(region)?;
    let windows = FireWindows::from_fire_dates(
        parse_date("start_date", start)?,
        parse_date("end_date", end)?,
        args.days.unwrap_or(settings.defaults.days_before_after),
    )?;
    let request = Request::new(region, windows, args.deliverables.iter().map(String::as_str))
        .with_mosaic_strategy(
            args.mosaic_strategy
                .unwrap_or(settings.defaults.mosaic_strategy),
        )
        .with_cloud_threshold(args.cloud_threshold.or(settings.defaults.cloud_threshold));

    single_outcome(pipeline.run(request, &TracingProgress).await)
}

/// Prints a single run's lines and returns the reports whose jobs `--wait`
/// should follow. Jobs submitted before a failure are still returned.
fn single_outcome(
    result: Result<RunReport, PipelineError>,
) -> Result<(Vec<RunReport>, bool), FireplanError> {
    match result {
        Ok(report) => {
            for result in &report.results {
                println!("{}", result.line());
            }
            Ok((vec![report], false))
        }
        Err(e) => {
            let Some(partial) = e.partial_report() else {
                return Err(e.into());
            };
            eprintln!("Run {} stopped: {}", partial.run_id, e);
            for result in &partial.results {
                println!("{}", result.line());
            }
            for handle in partial.handles() {
                eprintln!("Already submitted: {}", handle);
            }
            Ok((vec![partial.clone()], true))
        }
    }
}

async fn run_preset(
    settings: &Settings,
    pipeline: Arc<Pipeline>,
    name: &str,
) -> Result<(Vec<RunReport>, bool), FireplanError> {
    let runner = PresetRunner::new(
        Arc::new(settings.presets.clone()),
        pipeline,
        settings.defaults.clone(),
    );
    let report = runner.run(name, &TracingProgress).await?;
    Ok(preset_outcome(report))
}

fn preset_outcome(report: PresetReport) -> (Vec<RunReport>, bool) {
    let failed = !report.is_success();
    let mut reports = Vec::new();
    for group in report.groups {
        for outcome in group.runs {
            match outcome {
                Ok(run) => {
                    for result in &run.results {
                        println!("{}\t{}", group.label, result.line());
                    }
                    reports.push(run);
                }
                Err(e) => {
                    eprintln!("{}: {}", group.label, e);
                    if let Some(partial) = e.partial_report() {
                        for handle in partial.handles() {
                            eprintln!("{}: already submitted {}", group.label, handle);
                        }
                        reports.push(partial.clone());
                    }
                }
            }
        }
    }
    (reports, failed)
}

pub async fn monitor(
    args: MonitorArgs,
    config: Option<&Path>,
    watch: &WatchList,
) -> Result<ExitCode, FireplanError> {
    let settings = load_settings(config)?;
    let mut monitor_settings = settings.monitor;
    if let Some(secs) = args.poll_interval {
        monitor_settings.poll_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = args.timeout {
        monitor_settings.timeout = Duration::from_secs(secs);
    }
    let monitor = TaskMonitor::new(provider(&settings, args.dry_run)?, monitor_settings)?;

    let handle = JobHandle::new(args.job);
    watch.watch([&handle]);
    let mut job = ExportJob::observed(handle, args.label.as_deref());
    let observer = |event: &TaskEvent| print_state_change(event);
    let outcome = monitor.monitor_job(&mut job, &observer).await;
    print_outcome(&job, &outcome);

    if let Some(target) = args.notify {
        let notification = Notification::for_outcome(&job, &outcome);
        if let Err(e) = LogNotifier.send(&target, &notification).await {
            warn!("{}", e);
        }
    }

    Ok(match outcome {
        Ok(JobState::Completed) => ExitCode::SUCCESS,
        _ => ExitCode::from(EXIT_NOT_COMPLETED),
    })
}

pub fn list_deliverables() -> Result<ExitCode, FireplanError> {
    let catalog = DeliverableCatalog::standard()?;
    for deliverable in catalog.deliverables() {
        let dependencies: Vec<&str> = deliverable
            .dependencies()
            .iter()
            .map(|id| catalog.name_of(*id))
            .collect();
        println!(
            "{}\t{}\t{}",
            deliverable.name(),
            deliverable.category(),
            dependencies.join(",")
        );
    }
    Ok(ExitCode::SUCCESS)
}

pub fn list_presets(config: Option<&Path>) -> Result<ExitCode, FireplanError> {
    let settings = load_settings(config)?;
    if settings.presets.is_empty() {
        eprintln!("No presets configured");
    }
    for preset in settings.presets.iter() {
        println!(
            "{}\t{}\t{} run(s)\t{}",
            preset.name,
            preset.mode,
            preset.runs.len(),
            preset.description.as_deref().unwrap_or("")
        );
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fireplan::{PresetMode, RemoteError, StudyAreaResults};

    fn report_with_jobs(run_id: &str, handles: &[&str]) -> RunReport {
        RunReport {
            run_id: run_id.to_string(),
            results: Vec::new(),
            jobs: handles
                .iter()
                .map(|h| ExportJob::new(JobHandle::new(*h), "NBR_PRE_FIRE", "gs://b/x"))
                .collect(),
            steps_computed: handles.len(),
            cache_hits: 0,
        }
    }

    #[test]
    fn test_submission_failure_keeps_submitted_jobs() {
        let err = PipelineError::Submission {
            deliverable: "DNBR".to_string(),
            source: RemoteError::Unavailable("down".to_string()),
            partial: Box::new(report_with_jobs("run-1", &["JOB_1", "JOB_2"])),
        };

        let (reports, failed) = single_outcome(Err(err)).unwrap();

        assert!(failed);
        let handles: Vec<&str> = reports
            .iter()
            .flat_map(|r| r.jobs.iter().map(|j| j.handle.as_str()))
            .collect();
        assert_eq!(handles, vec!["JOB_1", "JOB_2"]);
    }

    #[test]
    fn test_input_failure_is_an_error() {
        let err = PipelineError::Input(fireplan::InputError::NoDeliverables);
        assert!(single_outcome(Err(err)).is_err());
    }

    #[test]
    fn test_preset_partial_jobs_are_watched() {
        let report = PresetReport {
            preset: "p".to_string(),
            mode: PresetMode::Full,
            groups: vec![
                StudyAreaResults {
                    label: "ok".to_string(),
                    runs: vec![Ok(report_with_jobs("run-1", &["JOB_1"]))],
                },
                StudyAreaResults {
                    label: "broken".to_string(),
                    runs: vec![Err(PipelineError::Submission {
                        deliverable: "DNBR".to_string(),
                        source: RemoteError::Unavailable("down".to_string()),
                        partial: Box::new(report_with_jobs("run-2", &["JOB_2"])),
                    })],
                },
            ],
        };

        let (reports, failed) = preset_outcome(report);

        assert!(failed);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].jobs[0].handle.as_str(), "JOB_2");
    }
}
