// src/display/backend.rs

//! Backend selection: the ordered-candidate probe cascade that decides how
//! pixels reach the panel.
//!
//! The decision function is pure over a `DriverProbe`, so the cascade is
//! testable with scripted fakes; the production probe opens the device node
//! each driver fronts and reads the mode from sysfs. When every candidate
//! fails, output falls back to raw framebuffer writes, which needs no
//! initialization and cannot fail.

use anyhow::{bail, Context};
use bitflags::bitflags;
use log::{info, warn};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

/// Environment variable naming the one driver to use. Authoritative when
/// set: a failure of the named driver fails selection outright.
pub const VIDEO_DRIVER_ENV: &str = "ROUNDPLAY_VIDEO_DRIVER";

/// Environment variable overriding the raw-mode framebuffer device path.
pub const FBDEV_ENV: &str = "ROUNDPLAY_FBDEV";

const DEFAULT_FBDEV: &str = "/dev/fb0";
const FB_VIRTUAL_SIZE: &str = "/sys/class/graphics/fb0/virtual_size";

/// Side of the square in-memory surface used when no driver initializes.
pub const RAW_FALLBACK_SIZE: u32 = 480;

bitflags! {
    /// Surface-creation flags passed to every probe.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SurfaceFlags: u32 {
        const FULLSCREEN = 1 << 0;
        const DOUBLEBUF  = 1 << 1;
        const NOFRAME    = 1 << 2;
        const HWSURFACE  = 1 << 3;
    }
}

impl SurfaceFlags {
    /// The flag set used for every surface this application creates.
    pub const STANDARD: SurfaceFlags = SurfaceFlags::all();
}

/// The graphics output drivers the selector knows, in probe priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    /// Native accelerated framebuffer (VideoCore).
    Accel,
    /// Kernel mode-setting.
    KmsDrm,
    /// Console framebuffer.
    FbCon,
    /// Legacy direct rendering.
    DirectFb,
    /// Legacy SVGA direct rendering.
    SvgaLib,
}

impl DriverKind {
    /// First success wins; order encodes preference.
    pub const PRIORITY: [DriverKind; 5] = [
        DriverKind::Accel,
        DriverKind::KmsDrm,
        DriverKind::FbCon,
        DriverKind::DirectFb,
        DriverKind::SvgaLib,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DriverKind::Accel => "accel",
            DriverKind::KmsDrm => "kmsdrm",
            DriverKind::FbCon => "fbcon",
            DriverKind::DirectFb => "directfb",
            DriverKind::SvgaLib => "svgalib",
        }
    }

    pub fn from_name(name: &str) -> Option<DriverKind> {
        DriverKind::PRIORITY
            .into_iter()
            .find(|kind| kind.name() == name)
    }

    /// The device node this driver fronts.
    pub fn device_node(self) -> &'static str {
        match self {
            DriverKind::Accel => "/dev/vchiq",
            DriverKind::KmsDrm => "/dev/dri/card0",
            DriverKind::FbCon | DriverKind::DirectFb => "/dev/fb0",
            DriverKind::SvgaLib => "/dev/svga",
        }
    }
}

/// What a successful probe learned: the reported mode, before any rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbedDisplay {
    pub width: u32,
    pub height: u32,
}

/// One attempt to initialize one driver. The production implementation is
/// `DeviceNodeProbe`; tests inject scripted results.
pub trait DriverProbe {
    fn probe(&mut self, kind: DriverKind, flags: SurfaceFlags) -> anyhow::Result<ProbedDisplay>;
}

/// How presented frames reach the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// A driver-backed surface that is flipped to the screen.
    Windowed,
    /// Direct RGB565 writes to the framebuffer device file.
    RawFramebuffer,
}

/// The outcome of backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub width: u32,
    pub height: u32,
    pub mode: DisplayMode,
    /// The winning driver; `None` in raw fallback mode.
    pub driver: Option<DriverKind>,
}

/// The 480x480 mode report is a known offset bug in that reporting path;
/// the real scanout is 640x480. Any other report passes through unchanged.
pub fn fix_reported_resolution(width: u32, height: u32) -> (u32, u32) {
    if (width, height) == (480, 480) {
        (640, 480)
    } else {
        (width, height)
    }
}

/// Reads the driver override from the environment.
pub fn video_driver_override() -> Option<String> {
    env::var(VIDEO_DRIVER_ENV).ok()
}

/// The framebuffer device path used by raw-mode presents.
pub fn fbdev_path() -> PathBuf {
    env::var(FBDEV_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_FBDEV))
}

/// Runs the selection cascade.
///
/// With `override_name` set, exactly that driver is attempted and its
/// failure propagates. Otherwise candidates are probed in priority order,
/// first success winning; exhaustion falls back to a raw in-memory surface,
/// which cannot fail.
pub fn select_backend(
    probe: &mut dyn DriverProbe,
    override_name: Option<&str>,
    flags: SurfaceFlags,
) -> anyhow::Result<Selection> {
    if let Some(name) = override_name {
        let Some(kind) = DriverKind::from_name(name) else {
            bail!("unknown video driver {:?} in {}", name, VIDEO_DRIVER_ENV);
        };
        info!("Using driver specified by {}: {}", VIDEO_DRIVER_ENV, name);
        let probed = probe
            .probe(kind, flags)
            .with_context(|| format!("initializing driver {:?} (override)", name))?;
        let (width, height) = fix_reported_resolution(probed.width, probed.height);
        return Ok(Selection {
            width,
            height,
            mode: DisplayMode::Windowed,
            driver: Some(kind),
        });
    }

    for kind in DriverKind::PRIORITY {
        match probe.probe(kind, flags) {
            Ok(probed) => {
                let (width, height) = fix_reported_resolution(probed.width, probed.height);
                info!(
                    "Using driver: {}, framebuffer size: {} x {}",
                    kind.name(),
                    width,
                    height
                );
                return Ok(Selection {
                    width,
                    height,
                    mode: DisplayMode::Windowed,
                    driver: Some(kind),
                });
            }
            Err(e) => {
                warn!("Driver \"{}\" failed: {:#}", kind.name(), e);
            }
        }
    }

    warn!("All drivers failed, falling back to raw framebuffer access.");
    Ok(Selection {
        width: RAW_FALLBACK_SIZE,
        height: RAW_FALLBACK_SIZE,
        mode: DisplayMode::RawFramebuffer,
        driver: None,
    })
}

/// Production probe: a driver is usable when its device node opens for
/// writing and the framebuffer mode is readable from sysfs.
pub struct DeviceNodeProbe;

impl DriverProbe for DeviceNodeProbe {
    fn probe(&mut self, kind: DriverKind, _flags: SurfaceFlags) -> anyhow::Result<ProbedDisplay> {
        let node = kind.device_node();
        OpenOptions::new()
            .write(true)
            .open(node)
            .with_context(|| format!("opening {}", node))?;
        let raw = fs::read_to_string(FB_VIRTUAL_SIZE)
            .with_context(|| format!("reading {}", FB_VIRTUAL_SIZE))?;
        let (width, height) = parse_virtual_size(&raw)
            .with_context(|| format!("parsing mode {:?} from {}", raw.trim(), FB_VIRTUAL_SIZE))?;
        Ok(ProbedDisplay { width, height })
    }
}

/// Parses the sysfs `virtual_size` format, `"WIDTH,HEIGHT\n"`.
fn parse_virtual_size(input: &str) -> Option<(u32, u32)> {
    let mut parts = input.trim().split(',');
    let width = parts.next()?.trim().parse().ok()?;
    let height = parts.next()?.trim().parse().ok()?;
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::RefCell;
    use test_log::test;

    /// Scripted probe: a result per candidate, recording the order asked.
    struct ScriptedProbe {
        results: RefCell<Vec<(DriverKind, anyhow::Result<ProbedDisplay>)>>,
        asked: RefCell<Vec<DriverKind>>,
    }

    impl ScriptedProbe {
        fn new(results: Vec<(DriverKind, anyhow::Result<ProbedDisplay>)>) -> Self {
            ScriptedProbe {
                results: RefCell::new(results),
                asked: RefCell::new(Vec::new()),
            }
        }

        fn all_failing() -> Self {
            ScriptedProbe::new(
                DriverKind::PRIORITY
                    .into_iter()
                    .map(|kind| (kind, Err(anyhow!("no such device"))))
                    .collect(),
            )
        }
    }

    impl DriverProbe for ScriptedProbe {
        fn probe(
            &mut self,
            kind: DriverKind,
            _flags: SurfaceFlags,
        ) -> anyhow::Result<ProbedDisplay> {
            self.asked.borrow_mut().push(kind);
            let mut results = self.results.borrow_mut();
            let pos = results
                .iter()
                .position(|(k, _)| *k == kind)
                .unwrap_or_else(|| panic!("unscripted probe of {:?}", kind));
            results.remove(pos).1
        }
    }

    fn ok(width: u32, height: u32) -> anyhow::Result<ProbedDisplay> {
        Ok(ProbedDisplay { width, height })
    }

    #[test]
    fn first_success_wins_and_later_candidates_are_never_probed() {
        let mut probe = ScriptedProbe::new(vec![
            (DriverKind::Accel, Err(anyhow!("boom"))),
            (DriverKind::KmsDrm, Err(anyhow!("boom"))),
            (DriverKind::FbCon, ok(800, 480)),
        ]);
        let selection = select_backend(&mut probe, None, SurfaceFlags::STANDARD).unwrap();
        assert_eq!(selection.driver, Some(DriverKind::FbCon));
        assert_eq!((selection.width, selection.height), (800, 480));
        assert_eq!(selection.mode, DisplayMode::Windowed);
        assert_eq!(
            *probe.asked.borrow(),
            vec![DriverKind::Accel, DriverKind::KmsDrm, DriverKind::FbCon]
        );
    }

    #[test]
    fn reported_480x480_is_rewritten_to_640x480() {
        let mut probe = ScriptedProbe::new(vec![(DriverKind::Accel, ok(480, 480))]);
        let selection = select_backend(&mut probe, None, SurfaceFlags::STANDARD).unwrap();
        assert_eq!((selection.width, selection.height), (640, 480));
    }

    #[test]
    fn other_resolutions_pass_through_unchanged() {
        assert_eq!(fix_reported_resolution(720, 720), (720, 720));
        assert_eq!(fix_reported_resolution(640, 480), (640, 480));
        assert_eq!(fix_reported_resolution(480, 481), (480, 481));
    }

    #[test]
    fn exhaustion_falls_back_to_raw_480x480() {
        let mut probe = ScriptedProbe::all_failing();
        let selection = select_backend(&mut probe, None, SurfaceFlags::STANDARD).unwrap();
        assert_eq!(selection.mode, DisplayMode::RawFramebuffer);
        assert_eq!((selection.width, selection.height), (480, 480));
        assert_eq!(selection.driver, None);
        assert_eq!(probe.asked.borrow().len(), DriverKind::PRIORITY.len());
    }

    #[test]
    fn override_is_authoritative_and_skips_fallback() {
        let mut probe = ScriptedProbe::new(vec![(DriverKind::KmsDrm, Err(anyhow!("boom")))]);
        let result = select_backend(&mut probe, Some("kmsdrm"), SurfaceFlags::STANDARD);
        assert!(result.is_err());
        assert_eq!(*probe.asked.borrow(), vec![DriverKind::KmsDrm]);
    }

    #[test]
    fn override_success_applies_resolution_rewrite() {
        let mut probe = ScriptedProbe::new(vec![(DriverKind::FbCon, ok(480, 480))]);
        let selection =
            select_backend(&mut probe, Some("fbcon"), SurfaceFlags::STANDARD).unwrap();
        assert_eq!((selection.width, selection.height), (640, 480));
        assert_eq!(selection.driver, Some(DriverKind::FbCon));
    }

    #[test]
    fn unknown_override_name_fails_without_probing() {
        let mut probe = ScriptedProbe::all_failing();
        let result = select_backend(&mut probe, Some("warp-drive"), SurfaceFlags::STANDARD);
        assert!(result.is_err());
        assert!(probe.asked.borrow().is_empty());
    }

    #[test]
    fn virtual_size_parses_sysfs_format() {
        assert_eq!(parse_virtual_size("480,480\n"), Some((480, 480)));
        assert_eq!(parse_virtual_size("1920, 1080"), Some((1920, 1080)));
        assert_eq!(parse_virtual_size("garbage"), None);
        assert_eq!(parse_virtual_size(""), None);
    }
}
