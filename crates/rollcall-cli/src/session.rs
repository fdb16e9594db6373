//! Session orchestration: the attendance capture loop and the interactive
//! registration flow.
//!
//! Single-threaded and blocking throughout: one loop pulls a frame, runs
//! detection and matching, and either appends a ledger line or drops into
//! the registration form. The camera handle is scoped to each operation and
//! released before control returns to the menu.

use crate::config::Config;
use crate::console;
use anyhow::Result;
use chrono::Local;
use rollcall_core::{
    CascadeDetector, DetectParams, FaceSample, Matcher, Person, PixelNormMatcher, Role,
};
use rollcall_hw::{Camera, Frame};
use rollcall_store::{AttendanceLedger, FaceStore, PersonRegistry, TIMESTAMP_FORMAT};

pub struct Session {
    detector: CascadeDetector,
    matcher: PixelNormMatcher,
    params: DetectParams,
    registry: PersonRegistry,
    faces: FaceStore,
    ledger: AttendanceLedger,
    camera_device: String,
}

impl Session {
    pub fn new(detector: CascadeDetector, config: &Config) -> Self {
        Self {
            detector,
            matcher: PixelNormMatcher {
                threshold: config.match_threshold,
            },
            params: config.detect_params(),
            registry: PersonRegistry::new(config.details_file.clone()),
            faces: FaceStore::new(config.faces_dir.clone()),
            ledger: AttendanceLedger::new(config.attendance_file.clone()),
            camera_device: config.camera_device.clone(),
        }
    }

    /// Run the attendance capture loop until the operator cancels or the
    /// camera stops delivering frames.
    ///
    /// Per frame: detect; no face loops; a face matching a registered sample
    /// appends a ledger line; an unknown face enters interactive
    /// registration bound to the face just captured.
    pub fn mark_attendance(&mut self) -> Result<()> {
        let camera = Camera::open(&self.camera_device)?;
        let mut stream = camera.stream()?;

        println!("Marking attendance. Press 'q' then Enter to stop.");

        loop {
            if console::cancel_requested() {
                println!("Attendance session stopped.");
                break;
            }

            let frame = match stream.next_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(error = %e, "capture failed; ending attendance session");
                    break;
                }
            };

            let regions = self
                .detector
                .detect(&frame.data, frame.width, frame.height, &self.params);
            let Some(region) = regions.first() else {
                continue;
            };
            let probe = FaceSample::crop(&frame.data, frame.width, frame.height, region);

            let matched = {
                let gallery = self.faces.gallery();
                self.matcher.best_match(&probe, &gallery)
            };

            match matched {
                Some(id) => {
                    // Face store and registry are registered together, so a
                    // matched ID always resolves; guard anyway.
                    let Some(person) = self.registry.lookup(id) else {
                        tracing::warn!(id, "matched face has no registry entry; skipping");
                        continue;
                    };
                    let now = Local::now();
                    println!("Marking attendance for: {person}");
                    if let Err(e) = self.ledger.record(person, now) {
                        tracing::warn!(error = %e, "attendance announced but not persisted");
                    }
                }
                None => {
                    println!("Unknown person detected. Registering new person...");
                    self.register_interactive(probe)?;
                }
            }
        }

        Ok(())
    }

    /// Menu-driven registration: capture one frame, then run the form.
    pub fn register_once(&mut self) -> Result<()> {
        let camera = Camera::open(&self.camera_device)?;
        let frame = camera.capture_one()?;
        drop(camera);

        let now = Local::now();
        println!("Capture time: {}", now.format(TIMESTAMP_FORMAT));

        let sample = self.sample_from_frame(&frame);
        self.register_interactive(sample)
    }

    /// Prefer the first detected face crop; fall back to the whole frame
    /// when the registration capture contains no detectable face.
    fn sample_from_frame(&self, frame: &Frame) -> FaceSample {
        let regions = self
            .detector
            .detect(&frame.data, frame.width, frame.height, &self.params);
        match regions.first() {
            Some(region) => FaceSample::crop(&frame.data, frame.width, frame.height, region),
            None => {
                tracing::warn!("no face detected in registration frame; storing the full frame");
                FaceSample::from_raw(frame.data.clone(), frame.width, frame.height)
            }
        }
    }

    /// Run the registration form and bind `sample` to the entered identity.
    ///
    /// Invalid input (non-numeric ID, unrecognized role letter) aborts with a
    /// message and registers nothing. Persistence failures are surfaced as
    /// warnings; the in-memory registration stands either way.
    fn register_interactive(&mut self, sample: FaceSample) -> Result<()> {
        let Some(id) = console::prompt_id("Enter ID: ")? else {
            eprintln!("Invalid ID. Registration aborted.");
            return Ok(());
        };
        let name = console::prompt_line("Enter Name: ")?;
        let department = console::prompt_line("Enter Department: ")?;
        let subject = console::prompt_line("Enter Subject: ")?;

        let tag = console::prompt_line("Is the person a Student (S) or Teacher (T)? ")?;
        let Some(role) = tag
            .chars()
            .next()
            .and_then(|c| Role::from_tag(c, department, subject))
        else {
            eprintln!("Invalid role. Please enter 'S' for Student or 'T' for Teacher.");
            return Ok(());
        };

        let person = Person { id, name, role };

        if let Err(e) = self.registry.register(person) {
            tracing::warn!(error = %e, "person registered but details line not persisted");
        }
        if let Err(e) = self.faces.insert(id, sample) {
            tracing::warn!(error = %e, "person registered but reference image not persisted");
        }

        println!("New person registered.");
        Ok(())
    }
}
