//! SBC GPIO Tool
//!
//! Command-line front end for the `sbc_gpio` library: inspect chip register
//! layouts and board headers, drive pins and wait for edge interrupts.
//!
//! # Features
//!
//! - **Chips**: register windows, write conventions and pin tables for
//!   RK356X, RK3588, RK3399 and A311D
//! - **Boards**: header wiring of Radxa boards, plus custom TOML profiles
//! - **Pins**: mode, read, write and toggle through `/dev/mem`
//! - **Interrupts**: sysfs edge arming with bounded waits
//! - **Simulation**: `--simulate` runs every register access against memory
//!   and prints the resulting register values
//!
//! # Usage
//!
//! ```bash
//! # List supported chips and boards
//! sbc-gpio chips list
//! sbc-gpio boards list
//!
//! # Show the 40-pin header of a ROCK 3A
//! sbc-gpio boards show rock3a
//!
//! # Drive header pin 0 high until Ctrl-C
//! sudo sbc-gpio --board rock3a pin write 0 1
//!
//! # Blink it without touching hardware
//! sbc-gpio --board rock3a --simulate pin toggle 0 --count 4
//!
//! # Wait up to 5 seconds for a rising edge
//! sudo sbc-gpio --board rock5b irq wait 3 --edge rising --timeout-ms 5000
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use sbc_gpio::board::{board_names, find_board, get_board};
use sbc_gpio::soc::{chip_names, get_chip};
use sbc_gpio::{
    Board, BoardProfile, ChipFamily, EdgeMode, HalConfig, Level, PinMode, WaitOutcome,
};

/// SBC GPIO Tool
///
/// Userspace GPIO for Rockchip and Amlogic single-board computers
#[derive(Parser)]
#[command(name = "sbc-gpio")]
#[command(author = "Prasanna Gautam")]
#[command(version = "0.1.0")]
#[command(about = "Userspace GPIO register and interrupt tool for single-board computers")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Board profile (e.g., rock3a, rock5b, radxa_zero2)
    #[arg(short, long, global = true)]
    board: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use simulated registers instead of /dev/mem
    #[arg(long, global = true)]
    simulate: bool,

    /// Sysfs GPIO class directory
    #[arg(long, global = true)]
    sysfs_root: Option<PathBuf>,

    /// Enable verbose output (register-level logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chip family operations
    #[command(subcommand)]
    Chips(ChipCommands),

    /// Board profile operations
    #[command(subcommand)]
    Boards(BoardCommands),

    /// Digital pin operations
    #[command(subcommand)]
    Pin(PinCommands),

    /// Edge interrupt operations
    #[command(subcommand)]
    Irq(IrqCommands),
}

#[derive(Subcommand)]
enum ChipCommands {
    /// List supported chip families
    List,

    /// Show register windows and pin table of a chip
    Show {
        /// Chip name (e.g., rk356x, rk3588, rk3399, a311d)
        chip: String,

        /// Also list every pin descriptor
        #[arg(long)]
        pins: bool,
    },
}

#[derive(Subcommand)]
enum BoardCommands {
    /// List built-in and configured board profiles
    List,

    /// Show the header wiring of a board
    Show {
        /// Board name (defaults to --board)
        board: Option<String>,
    },
}

#[derive(Subcommand)]
enum PinCommands {
    /// Configure a header pin as input or output
    Mode {
        /// Header pin index
        pin: usize,

        /// in | out
        mode: PinMode,
    },

    /// Drive a header pin
    Write {
        /// Header pin index
        pin: usize,

        /// 0 | 1 | low | high
        level: Level,

        /// Keep driving for this long (default: until Ctrl-C)
        #[arg(long)]
        hold_ms: Option<u64>,
    },

    /// Sample a header pin
    Read {
        /// Header pin index
        pin: usize,
    },

    /// Toggle a header pin
    Toggle {
        /// Header pin index
        pin: usize,

        /// Number of level changes
        #[arg(short = 'n', long, default_value = "10")]
        count: u32,

        /// Delay between changes
        #[arg(short, long, default_value = "500")]
        interval_ms: u64,
    },
}

#[derive(Subcommand)]
enum IrqCommands {
    /// Arm a pin and wait for one edge
    Wait {
        /// Header pin index (interrupt map)
        pin: usize,

        /// rising | falling | both | none
        #[arg(short, long, default_value = "both")]
        edge: EdgeMode,

        /// Give up after this long (negative waits forever)
        #[arg(short, long, default_value = "5000", allow_hyphen_values = true)]
        timeout_ms: i32,
    },

    /// Arm a pin and print every edge until Ctrl-C
    Watch {
        /// Header pin index (interrupt map)
        pin: usize,

        /// rising | falling | both | none
        #[arg(short, long, default_value = "both")]
        edge: EdgeMode,
    },
}

static RUNNING: AtomicBool = AtomicBool::new(true);

extern "C" fn handle_sigint(_: libc::c_int) {
    RUNNING.store(false, Ordering::SeqCst);
}

/// Route Ctrl-C to [`RUNNING`]; a blocked poll returns EINTR
fn install_sigint_handler() {
    // SAFETY: the handler only stores to an atomic.
    unsafe {
        libc::signal(libc::SIGINT, handle_sigint as libc::sighandler_t);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Chips(cmd) => handle_chips(cmd),
        Commands::Boards(cmd) => handle_boards(cmd, &config, cli.board.as_deref()),
        Commands::Pin(cmd) => handle_pin(cmd, &config),
        Commands::Irq(cmd) => handle_irq(cmd, &config),
    }
}

/// Config file first, then command-line overrides
fn load_config(cli: &Cli) -> Result<HalConfig> {
    let mut config = match &cli.config {
        Some(path) => HalConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => HalConfig::new(),
    };
    if let Some(board) = &cli.board {
        config = config.with_board(board);
    }
    if let Some(root) = &cli.sysfs_root {
        config = config.with_sysfs_root(root);
    }
    if cli.simulate {
        config = config.with_simulate(true);
    }
    Ok(config)
}

fn board_profile(config: &HalConfig, name: Option<&str>) -> Result<BoardProfile> {
    let name = name.or(config.board.as_deref()).ok_or_else(|| {
        anyhow::anyhow!("No board selected. Use --board <name> or set `board` in the config file.")
    })?;
    let custom = config.custom_boards().context("Failed to load custom boards")?;
    find_board(name, &custom).map_err(|_| {
        anyhow::anyhow!(
            "Unknown board: {}. Use 'sbc-gpio boards list' to see available boards.",
            name
        )
    })
}

fn open_board(config: &HalConfig) -> Result<Board> {
    let profile = board_profile(config, None)?;
    let board = Board::open(&profile, config)
        .with_context(|| format!("Failed to open {} ({})", profile.name, profile.chip))?;
    if board.simulated().is_some() {
        println!("{} Using simulated registers", "[*]".cyan().bold());
    }
    Ok(board)
}

fn handle_chips(cmd: ChipCommands) -> Result<()> {
    match cmd {
        ChipCommands::List => {
            println!("{}", "=".repeat(60));
            println!("{}", "Supported Chip Families".cyan().bold());
            println!("{}", "=".repeat(60));

            for name in chip_names() {
                if let Some(chip) = get_chip(name) {
                    let pins = chip.pins();
                    let digital = pins.iter().filter(|p| p.is_digital()).count();
                    println!("\n  {} ({})", name.white().bold(), chip.brand());
                    println!("    Register windows: {}", chip.windows().len());
                    println!("    GPIO lines: {} ({} digital)", pins.len(), digital);
                }
            }

            println!("\n{}", "=".repeat(60));
            println!(
                "Use {} to see register details",
                "sbc-gpio chips show <chip>".cyan()
            );
        }

        ChipCommands::Show { chip, pins } => {
            let family = get_chip(&chip).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown chip: {}. Use 'sbc-gpio chips list' to see available chips.",
                    chip
                )
            })?;
            print_chip(family, pins);
        }
    }

    Ok(())
}

fn print_chip(chip: &dyn ChipFamily, list_pins: bool) {
    println!("{}", "=".repeat(70));
    println!(
        "{}",
        format!("Chip: {} ({})", chip.chip(), chip.brand()).cyan().bold()
    );
    println!("{}", "=".repeat(70));

    println!("\n{}", "Register Windows:".white().bold());
    for (i, w) in chip.windows().iter().enumerate() {
        println!(
            "  [{}] {:<10} {:#010x}  {:>#8x} bytes  {}",
            i, w.name, w.phys_addr, w.len, w.convention
        );
    }

    let pins = chip.pins();
    println!("\n{}", "GPIO Lines:".white().bold());
    println!("  Total: {}", pins.len());
    println!(
        "  Digital: {}",
        pins.iter().filter(|p| p.is_digital()).count()
    );
    println!("  Direction polarity: {:?}", chip.direction_polarity());
    let edges: Vec<_> = chip.edge_modes().iter().map(|e| e.as_str()).collect();
    println!("  Edge modes: {}", edges.join(", "));

    if list_pins {
        println!();
        for p in &pins {
            let mux = match p.mux {
                Some(m) => format!(
                    "mux {}+{:#06x}[{}:{}]",
                    chip.windows()[m.window].name,
                    m.offset,
                    m.bit + m.width - 1,
                    m.bit
                ),
                None => "no mux".dimmed().to_string(),
            };
            println!(
                "  {:<10} gpio{:<4} dir {:#05x}.{:<2} out {:#05x}.{:<2} in {:#05x}.{:<2} {}",
                p.name,
                p.sysfs_line,
                p.direction.offset,
                p.direction.bit,
                p.output.offset,
                p.output.bit,
                p.input.offset,
                p.input.bit,
                mux
            );
        }
    }

    println!("\n{}", "=".repeat(70));
}

fn handle_boards(cmd: BoardCommands, config: &HalConfig, selected: Option<&str>) -> Result<()> {
    match cmd {
        BoardCommands::List => {
            println!("{}", "=".repeat(60));
            println!("{}", "Supported Boards".cyan().bold());
            println!("{}", "=".repeat(60));

            for name in board_names() {
                if let Some(board) = get_board(name) {
                    println!("  {:<14} {} [{}]", name.white().bold(), board.name, board.chip);
                }
            }

            let custom = config.custom_boards().context("Failed to load custom boards")?;
            if !custom.is_empty() {
                println!("\n{}", "Custom Boards:".white().bold());
                for board in &custom {
                    println!("  {:<14} {} [{}]", board.id.white().bold(), board.name, board.chip);
                }
            }

            println!("\n{}", "=".repeat(60));
            println!(
                "Use {} to see the header wiring",
                "sbc-gpio boards show <board>".cyan()
            );
        }

        BoardCommands::Show { board } => {
            let profile = board_profile(config, board.as_deref().or(selected))?;
            print_board(&profile)?;
        }
    }

    Ok(())
}

fn print_board(profile: &BoardProfile) -> Result<()> {
    let chip = get_chip(&profile.chip)
        .ok_or_else(|| anyhow::anyhow!("Board {} uses unknown chip {}", profile.id, profile.chip))?;
    let table = chip.pins();
    let map = profile.pin_map(&table)?;
    let irq = profile.irq_map(&table)?;

    println!("{}", "=".repeat(70));
    println!("{}", format!("Board: {}", profile.name).cyan().bold());
    println!("{}", "=".repeat(70));
    println!("  ID: {}", profile.id);
    println!("  Chip: {} ({})", chip.chip(), chip.brand());
    println!("  Header pins: {} ({} GPIO)", map.len(), map.connected());

    println!("\n{}", "Header:".white().bold());
    for (pin, entry) in map.iter() {
        match entry {
            Some(index) => {
                let p = &table[index];
                let irq_mark = if irq.get(pin).flatten().is_some() {
                    "irq".green()
                } else {
                    "-".dimmed()
                };
                println!(
                    "  {:>3}  {:<10} gpio{:<4} {:<8} {:<18} {}",
                    pin,
                    p.name,
                    p.sysfs_line,
                    chip.windows()[p.bank].name,
                    p.capabilities.to_string(),
                    irq_mark
                );
            }
            None => println!("  {:>3}  {}", pin, "-".dimmed()),
        }
    }

    println!("\n{}", "=".repeat(70));
    Ok(())
}

fn handle_pin(cmd: PinCommands, config: &HalConfig) -> Result<()> {
    let mut board = open_board(config)?;

    match cmd {
        PinCommands::Mode { pin, mode } => {
            board.soc_mut().pin_mode(pin, mode)?;
            println!(
                "{} {} set to {}",
                "[OK]".green().bold(),
                pin_label(&board, pin),
                mode
            );
        }

        PinCommands::Write {
            pin,
            level,
            hold_ms,
        } => {
            let soc = board.soc_mut();
            soc.pin_mode(pin, PinMode::Output)?;
            soc.digital_write(pin, level)?;
            println!(
                "{} {} driven {}",
                "[OK]".green().bold(),
                pin_label(&board, pin),
                level
            );
            print_registers(&board);

            match hold_ms {
                Some(ms) => thread::sleep(Duration::from_millis(ms)),
                None if board.simulated().is_none() => {
                    install_sigint_handler();
                    println!("{} Holding level, press Ctrl-C to release", "[*]".cyan().bold());
                    while RUNNING.load(Ordering::SeqCst) {
                        thread::sleep(Duration::from_millis(100));
                    }
                }
                None => {}
            }
        }

        PinCommands::Read { pin } => {
            let soc = board.soc_mut();
            soc.pin_mode(pin, PinMode::Input)?;
            let level = soc.digital_read(pin)?;
            println!("{} {} = {}", "[OK]".green().bold(), pin_label(&board, pin), level);
        }

        PinCommands::Toggle {
            pin,
            count,
            interval_ms,
        } => {
            install_sigint_handler();
            board.soc_mut().pin_mode(pin, PinMode::Output)?;
            let label = pin_label(&board, pin);

            let mut level = Level::Low;
            for i in 0..count {
                if !RUNNING.load(Ordering::SeqCst) {
                    break;
                }
                level = level.toggled();
                board.soc_mut().digital_write(pin, level)?;
                println!("{} {} #{} -> {}", "[*]".cyan().bold(), label, i + 1, level);
                thread::sleep(Duration::from_millis(interval_ms));
            }
            print_registers(&board);
        }
    }

    // dropping the board runs gc: outputs go back to input
    Ok(())
}

fn handle_irq(cmd: IrqCommands, config: &HalConfig) -> Result<()> {
    let mut board = open_board(config)?;
    install_sigint_handler();

    match cmd {
        IrqCommands::Wait {
            pin,
            edge,
            timeout_ms,
        } => {
            board.soc_mut().isr(pin, edge)?;
            println!(
                "{} Waiting for {} edge on {} ({} ms)",
                "[*]".cyan().bold(),
                edge,
                irq_label(&board, pin),
                timeout_ms
            );

            match board.soc_mut().wait_for_interrupt(pin, timeout_ms)? {
                WaitOutcome::Edge(level) => {
                    println!("{} Edge detected, level {}", "[OK]".green().bold(), level);
                }
                WaitOutcome::Timeout => {
                    println!("{} No edge within {} ms", "[TIMEOUT]".yellow().bold(), timeout_ms);
                }
                WaitOutcome::Interrupted => {
                    println!("\n{}", "Interrupted".yellow());
                }
            }
        }

        IrqCommands::Watch { pin, edge } => {
            board.soc_mut().isr(pin, edge)?;
            println!(
                "{} Watching {} edges on {}, press Ctrl-C to stop",
                "[*]".cyan().bold(),
                edge,
                irq_label(&board, pin)
            );

            let mut edges = 0u64;
            while RUNNING.load(Ordering::SeqCst) {
                match board.soc_mut().wait_for_interrupt(pin, 500)? {
                    WaitOutcome::Edge(level) => {
                        edges += 1;
                        let timestamp = Local::now().format("%H:%M:%S%.3f");
                        println!("{} #{} level {}", timestamp.to_string().dimmed(), edges, level);
                    }
                    WaitOutcome::Timeout => {}
                    WaitOutcome::Interrupted => break,
                }
            }
            println!("\n{} {} edges seen", "Stopping watch...".yellow(), edges);
        }
    }

    Ok(())
}

fn pin_label(board: &Board, pin: usize) -> String {
    match board.soc().pin_name(pin) {
        Some(name) => format!("pin {} ({})", pin, name),
        None => format!("pin {}", pin),
    }
}

fn irq_label(board: &Board, pin: usize) -> String {
    let soc = board.soc();
    soc.irq_map()
        .and_then(|map| map.get(pin).flatten())
        .and_then(|index| soc.pins().get(index))
        .map(|p| format!("pin {} ({}, gpio{})", pin, p.name, p.sysfs_line))
        .unwrap_or_else(|| format!("pin {}", pin))
}

/// In simulation mode, show every register that now holds a value
fn print_registers(board: &Board) {
    let Some(mem) = board.simulated() else {
        return;
    };
    let windows = board.soc().family().windows();

    println!("\n{}", "Simulated registers:".white().bold());
    for (addr, value) in mem.snapshot() {
        let window = windows
            .iter()
            .find(|w| addr >= w.phys_addr && addr < w.phys_addr + w.len as u64);
        match window {
            Some(w) => println!(
                "  {:<10} +{:#06x}  {:#010x}",
                w.name,
                addr - w.phys_addr,
                value
            ),
            None => println!("  {:#010x}  {:#010x}", addr, value),
        }
    }
    println!("  {} stores", mem.write_count());
}
