use std::{
    io::{self, Write},
    path::PathBuf,
    thread,
    time::Instant,
};

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, bail};
use quectel_monitor::{
    args::{Args, BandList, BandsAction, BandsArgs, Command},
    logging,
    poll::Poller,
    render::{self, RenderStyle},
    settings::{self, Settings},
    transport::{self, AtTransport},
    uci::UciOverlay,
};
use tracing::debug;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    logging::init(args.verbose);

    let config = match &args.config {
        Some(path) => Some(path.clone()),
        None => {
            let home = std::env::var_os("HOME").map(PathBuf::from);
            settings::find_config(home.as_deref())
        }
    };
    debug!(?config, "using config file");
    let settings = Settings::get(&args, config.as_deref(), &UciOverlay::load())
        .wrap_err("failed to load configuration")?;
    debug!(?settings, "loaded settings");

    let style = RenderStyle {
        color: settings.monitor.color,
    };
    let transport = transport::connect(&settings.modem)
        .wrap_err("failed to connect to the modem")?;
    let mut poller = Poller::new(transport);

    match &args.command {
        Command::Status { json } => {
            let snapshot = poller.poll();
            if *json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print!("{}", render::render_status(&snapshot, style));
            }
        }
        Command::Watch { .. } => watch(&mut poller, &settings, style)?,
        Command::Bands(BandsArgs { action: None }) => {
            let prefs = poller.band_preferences();
            print!("{}", render::render_band_preferences(&prefs));
        }
        Command::Bands(BandsArgs {
            action: Some(BandsAction::Set { lte, nr5g }),
        }) => set_bands(&mut poller, &settings, lte.as_ref(), nr5g.as_ref())?,
        Command::Lock => {
            print!("{}", render::render_cell_locks(&poller.cell_locks()));
        }
    }

    Ok(())
}

fn watch<T: AtTransport>(
    poller: &mut Poller<T>,
    settings: &Settings,
    style: RenderStyle,
) -> Result<()> {
    let interval = settings.monitor.refresh_interval();
    let mut stdout = io::stdout();

    loop {
        let started = Instant::now();
        let snapshot = poller.poll();

        // Clear the screen and home the cursor.
        let view = render::render_status(&snapshot, style);
        write!(stdout, "\x1b[2J\x1b[H{view}")?;
        stdout.flush()?;

        if settings.monitor.beeps_enabled {
            for i in 0..snapshot.beep_count() {
                if i > 0 {
                    thread::sleep(settings.monitor.beep_interval());
                }
                write!(stdout, "\x07")?;
                stdout.flush()?;
            }
        }

        if let Some(rest) = interval.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }
}

fn set_bands<T: AtTransport>(
    poller: &mut Poller<T>,
    settings: &Settings,
    lte: Option<&BandList>,
    nr5g: Option<&BandList>,
) -> Result<()> {
    // Without flags, fall back to the configured lists.
    let (lte, nr5g) = if lte.is_none() && nr5g.is_none() {
        (
            Some(settings.bands.lte.as_slice()).filter(|b| !b.is_empty()),
            Some(settings.bands.nr5g.as_slice()).filter(|b| !b.is_empty()),
        )
    } else {
        (lte.map(|l| l.0.as_slice()), nr5g.map(|l| l.0.as_slice()))
    };
    if lte.is_none() && nr5g.is_none() {
        bail!("no bands given and none configured in the [bands] section");
    }

    if let Some(bands) = lte {
        poller.set_bands("lte_band", bands)?;
    }
    if let Some(bands) = nr5g {
        poller.set_bands("nsa_nr5g_band", bands)?;
        poller.set_bands("nr5g_band", bands)?;
    }
    let prefs = poller.band_preferences();
    print!("{}", render::render_band_preferences(&prefs));

    Ok(())
}
