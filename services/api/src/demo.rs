use crate::infra::{parse_date, sample_site, ReplayCamera, ReplayGeolocation, SAMPLE_FRAME_SIZE};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use shiftgate::config::AppConfig;
use shiftgate::error::AppError;
use shiftgate::workflows::attendance::EntryType;
use shiftgate::workflows::clock::{
    AttendanceSink, CaptureError, ClockActionError, ClockActionOrchestrator, FixedClock,
    InMemoryAttendanceSink, RecordedEntry,
};
use shiftgate::workflows::face::{sample, CapturedFrame, FaceValidationPipeline};
use shiftgate::workflows::geofence::{EntityRef, GeoPoint, InMemoryLocationDirectory, WorkLocation};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Shift date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Worker identifier used for the scripted shift.
    #[arg(long, default_value = "w-001")]
    pub(crate) worker: String,
    /// Skip the rejected first attempts (far position, covered mouth).
    #[arg(long)]
    pub(crate) happy_path: bool,
}

type DemoOrchestrator = ClockActionOrchestrator<
    InMemoryLocationDirectory,
    ReplayGeolocation,
    ReplayCamera,
    InMemoryAttendanceSink,
    FixedClock,
>;

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        date,
        worker,
        happy_path,
    } = args;

    let config = AppConfig::load()?;
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let start = date.and_hms_opt(8, 0, 0).unwrap_or_default();
    let site = sample_site();
    // ~11 m east of the site center, then ~200 m north of it.
    let on_site = GeoPoint::new(site.center.latitude, site.center.longitude + 0.0001);
    let off_site = GeoPoint::new(site.center.latitude + 0.0018, site.center.longitude);

    let (fixes, frames) = if happy_path {
        (Vec::new(), Vec::new())
    } else {
        let masked = sample::SampleFrame::wall(SAMPLE_FRAME_SIZE)
            .map_err(|err| AppError::Clock(CaptureError::from(err).into()))?
            .face()
            .masked()
            .build();
        (vec![off_site], vec![masked])
    };

    let clock = Arc::new(FixedClock::new(start));
    let sink = Arc::new(InMemoryAttendanceSink::new());
    let orchestrator = demo_orchestrator(
        &config,
        site.clone(),
        ReplayGeolocation::new(fixes, on_site),
        frames,
        Arc::clone(&sink),
        Arc::clone(&clock),
    )?;

    let entity = EntityRef::worker(worker);
    println!("Shiftgate demo: {entity} at {} on {date}", site.name);

    let schedule = [
        (EntryType::ClockIn, Duration::zero()),
        (EntryType::BreakStart, Duration::hours(4)),
        (EntryType::BreakEnd, Duration::minutes(30)),
        (EntryType::ClockOut, Duration::minutes(270)),
    ];
    for (action, wait) in schedule {
        clock.advance(wait);
        let recorded = perform(&orchestrator, &entity, action).await?;
        println!(
            "- {} at {} | {:.1} m from {} | now {:?}",
            action.label(),
            recorded.entry.timestamp.format("%H:%M"),
            recorded.location.distance_meters,
            recorded.location.location_name,
            recorded.state
        );
        if let Some(row) = &recorded.timesheet {
            println!(
                "  timesheet: in {} | out {} | break {} min | {:.2} h worked",
                row.time_in.format("%H:%M"),
                row.time_out
                    .map(|out| out.format("%H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
                row.break_minutes,
                row.hours_worked
            );
        }
    }

    match orchestrator.begin(entity.clone(), EntryType::ClockIn).await {
        Ok(_) => println!("! a second clock in was unexpectedly allowed"),
        Err(err) => println!("- second Clock In refused [{}]: {err}", err.code()),
    }

    let entries = sink
        .entries_for_day(&entity, date)
        .await
        .map_err(ClockActionError::from)?;
    println!("{} entries recorded for {date}", entries.len());
    Ok(())
}

/// Wires the in-memory collaborators with the configured timeout and face thresholds.
fn demo_orchestrator(
    config: &AppConfig,
    site: WorkLocation,
    geolocation: ReplayGeolocation,
    frames: Vec<CapturedFrame>,
    sink: Arc<InMemoryAttendanceSink>,
    clock: Arc<FixedClock>,
) -> Result<DemoOrchestrator, AppError> {
    let pipeline = FaceValidationPipeline::new(config.face.thresholds()?);
    Ok(ClockActionOrchestrator::new(
        Arc::new(InMemoryLocationDirectory::new(vec![site])),
        Arc::new(geolocation),
        Arc::new(ReplayCamera::new(frames)),
        sink,
        clock,
        pipeline,
    )
    .with_geolocation_timeout(config.clock.geolocation_timeout))
}

/// Runs one action, retrying the location or photo step the way a user would.
async fn perform(
    orchestrator: &DemoOrchestrator,
    entity: &EntityRef,
    action: EntryType,
) -> Result<RecordedEntry, AppError> {
    const MAX_ATTEMPTS: usize = 3;

    let mut session = orchestrator.begin(entity.clone(), action).await?;
    let mut outcome = session.run().await;
    for _ in 1..MAX_ATTEMPTS {
        let err = match outcome {
            Ok(recorded) => return Ok(recorded),
            Err(err) => err,
        };
        println!("  {} rejected [{}]: {}", action.label(), err.code(), err.message());
        outcome = match err {
            ClockActionError::Geofence(_) => session.retry_location().await,
            ClockActionError::Face(_) | ClockActionError::Capture(_) => session.retake().await,
            other => return Err(other.into()),
        };
    }
    Ok(outcome?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftgate::config::{
        AppEnvironment, ClockConfig, FaceConfig, ServerConfig, TelemetryConfig,
    };
    use std::path::PathBuf;
    use std::time::Duration;

    fn config(timeout: Duration, thresholds_path: Option<PathBuf>) -> AppConfig {
        AppConfig {
            environment: AppEnvironment::Test,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
            },
            clock: ClockConfig {
                geolocation_timeout: timeout,
            },
            face: FaceConfig { thresholds_path },
        }
    }

    fn build(config: &AppConfig) -> Result<DemoOrchestrator, AppError> {
        let site = sample_site();
        let start = NaiveDate::from_ymd_opt(2025, 6, 2)
            .and_then(|date| date.and_hms_opt(8, 0, 0))
            .expect("valid timestamp");
        demo_orchestrator(
            config,
            site.clone(),
            ReplayGeolocation::new(Vec::new(), site.center),
            Vec::new(),
            Arc::new(InMemoryAttendanceSink::new()),
            Arc::new(FixedClock::new(start)),
        )
    }

    #[test]
    fn configured_geolocation_timeout_reaches_orchestrator() {
        let orchestrator =
            build(&config(Duration::from_secs(7), None)).expect("orchestrator builds");
        assert_eq!(orchestrator.geolocation_timeout(), Duration::from_secs(7));
    }

    #[test]
    fn unreadable_thresholds_file_stops_the_demo() {
        let missing = PathBuf::from("/nonexistent/shiftgate/thresholds.json");
        let err = build(&config(Duration::from_secs(15), Some(missing)))
            .err()
            .expect("thresholds file is required once configured");
        assert!(matches!(err, AppError::Config(_)));
    }
}
