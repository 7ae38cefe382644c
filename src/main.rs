use clap::Parser;
use notebridge::{
    cli::{validate_device, Args, Command},
    handle_device_list,
    midi::DefaultMidiEngine,
    protocol::{parse_note_lines, LineOutcome},
    receiver::run_listener,
    ui::create_listen_spinner,
    Handled, MessageHandler, Settings, Timeline, TransferError, Transmitter,
};
use std::error::Error;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

fn main() {
    let args = parse_command_line_arguments();
    let settings = load_settings(args.config.as_deref());
    initialize_logging(&settings);

    let result = match args.command {
        Command::Devices => {
            list_available_devices(&get_available_devices());
            Ok(())
        }
        Command::SendNotes {
            file,
            device,
            no_progress,
        } => send_notes(&settings, file.as_deref(), device, !no_progress),
        Command::SendTempo { bpm, device } => send_tempo(&settings, bpm, device),
        Command::Listen { device, dump } => listen(&settings, device, dump.as_deref()),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn parse_command_line_arguments() -> Args {
    Args::parse()
}

fn load_settings(path: Option<&Path>) -> Settings {
    match Settings::load(path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn initialize_logging(settings: &Settings) {
    // Logging is best effort; the tools still work without a log file
    if let Err(e) = notebridge::logging::init_logger(settings.log_level) {
        eprintln!("Logging disabled: {}", e);
    }
    log::info!("Application starting");
}

fn get_available_devices() -> Vec<String> {
    handle_device_list()
}

fn list_available_devices(devices: &[String]) {
    println!("Available MIDI devices:");
    if devices.is_empty() {
        println!("  (none)");
    }
    for device in devices {
        println!("  - {}", device);
    }
}

fn resolve_device(
    flag: Option<String>,
    configured: &Option<String>,
    direction: &str,
) -> Result<String, Box<dyn Error>> {
    let name = flag.or_else(|| configured.clone()).ok_or_else(|| {
        format!(
            "No {} device given; pass --device or set {}_device",
            direction, direction
        )
    })?;
    validate_device(&name, &get_available_devices())?;
    Ok(name)
}

fn read_note_text(file: Option<&Path>) -> Result<String, Box<dyn Error>> {
    match file {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn print_line_summary(outcomes: &[LineOutcome]) {
    for outcome in outcomes {
        match outcome {
            LineOutcome::Accepted { line, note } => println!(
                "Line {}: note={}, velocity={}, length={:.1}, position={:.1}",
                line, note.pitch, note.velocity, note.length, note.position
            ),
            LineOutcome::Skipped { line, text, reason } => {
                println!("Line {}: skipped '{}' ({})", line, text, reason)
            }
        }
    }
}

fn send_notes(
    settings: &Settings,
    file: Option<&Path>,
    device: Option<String>,
    show_progress: bool,
) -> Result<(), Box<dyn Error>> {
    let outcomes = parse_note_lines(&read_note_text(file)?);
    print_line_summary(&outcomes);

    let notes: Vec<_> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            LineOutcome::Accepted { note, .. } => Some(*note),
            LineOutcome::Skipped { .. } => None,
        })
        .collect();
    if notes.is_empty() {
        return Err(TransferError::Empty.into());
    }

    let device_name = resolve_device(device, &settings.output_device, "output")?;
    let engine = DefaultMidiEngine::new(None, Some(&device_name))?;
    let mut transmitter =
        Transmitter::new(engine, settings.channel, settings.timing()).with_progress(show_progress);

    let report = transmitter.send_notes(notes)?;
    if report.saturated {
        println!(
            "Warning: count capped at {}; the receiver will ignore notes beyond it",
            report.declared_count
        );
    }
    println!(
        "Melody transferred: {} notes ({} MIDI values) to {}",
        report.notes_sent, report.frames_sent, device_name
    );
    Ok(())
}

fn send_tempo(settings: &Settings, bpm: i64, device: Option<String>) -> Result<(), Box<dyn Error>> {
    let device_name = resolve_device(device, &settings.output_device, "output")?;
    let engine = DefaultMidiEngine::new(None, Some(&device_name))?;
    let mut transmitter = Transmitter::new(engine, settings.channel, settings.timing());

    let sent = transmitter.send_tempo(bpm)?;
    println!("Tempo change to {} BPM sent to {}", sent, device_name);
    Ok(())
}

fn listen(
    settings: &Settings,
    device: Option<String>,
    dump: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let device_name = resolve_device(device, &settings.input_device, "input")?;
    let mut engine = DefaultMidiEngine::new(Some(&device_name), None)?;

    let mut dump_file = match dump {
        Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
        None => None,
    };

    let mut handler = MessageHandler::new(
        Timeline::new(settings.ppq),
        settings.framing,
        settings.placement(),
    )
    .listen_on_channel(settings.channel);

    let spinner = create_listen_spinner();
    spinner.set_message(format!("{} ({} framing)", device_name, settings.framing));

    let result = run_listener(&mut engine, &mut handler, |handled, host: &Timeline| {
        match handled {
            Handled::Note(note) => {
                spinner.println(format!("Inserted note {}", note));
                if let Some(file) = dump_file.as_mut() {
                    if let Err(e) = writeln!(file, "{}", note) {
                        log::error!("Failed to write dump file: {}", e);
                    }
                }
            }
            Handled::Tempo(bpm) => spinner.println(format!("Tempo set to {} BPM", bpm)),
            Handled::TransferFinished { received } => {
                spinner.println(format!("Transfer ended after {} notes", received))
            }
            Handled::Ignored | Handled::Consumed => {}
        }
        spinner.set_message(format!(
            "{} notes on timeline, tempo {}",
            host.notes().len(),
            host.tempo()
                .map_or_else(|| "unchanged".to_string(), |bpm| format!("{} BPM", bpm))
        ));
        spinner.tick();
    });

    spinner.finish_and_clear();
    log::info!("Listener received {} notes", handler.host().notes().len());
    result?;
    Ok(())
}
