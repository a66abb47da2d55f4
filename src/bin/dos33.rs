/// Interactive DOS 3.3 console application

use dos33manager::*;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

/// Load address used by add-file when none is given
const DEFAULT_LOAD_ADDRESS: u16 = 0x0800;

/// Command completer for the REPL
struct CommandCompleter {
    commands: Vec<&'static str>,
}

impl CommandCompleter {
    fn new() -> Self {
        Self {
            commands: vec![
                "add-dos",
                "add-file",
                "add-text",
                "cat",
                "catalog",
                "create",
                "delete",
                "exit",
                "extract",
                "help",
                "info",
                "lock",
                "map",
                "open",
                "quit",
                "read-sector",
                "save",
                "tslist",
                "unlock",
            ],
        }
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Only complete the first word (command name)
        let line_to_cursor = &line[..pos];
        if line_to_cursor.contains(' ') {
            return Ok((pos, vec![]));
        }

        let prefix = line_to_cursor.to_lowercase();
        let matches: Vec<Pair> = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(&prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

/// Get the path to the history file
fn history_path() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".dos33manager_history");
        p
    })
}

/// What the console should do after a command
enum Flow {
    Continue,
    Quit,
}

/// Console state: the image being worked on
struct Session {
    image: Option<DiskImage>,
}

impl Session {
    fn image(&self) -> Option<&DiskImage> {
        if self.image.is_none() {
            println!("No image loaded. Use 'open <path>' or 'create' first.");
        }
        self.image.as_ref()
    }

    fn image_mut(&mut self) -> Option<&mut DiskImage> {
        if self.image.is_none() {
            println!("No image loaded. Use 'open <path>' or 'create' first.");
        }
        self.image.as_mut()
    }

    fn execute(&mut self, parts: &[String]) -> Flow {
        let command = parts[0].to_lowercase();
        let args = &parts[1..];

        let result = match command.as_str() {
            "help" => {
                print_help();
                Ok(())
            }
            "quit" | "exit" => return Flow::Quit,
            "open" => self.open(args),
            "create" => self.create(args),
            "info" => self.info(),
            "cat" | "catalog" => self.catalog(),
            "read-sector" => self.read_sector(args),
            "tslist" => self.tslist(args),
            "add-dos" => self.add_dos(args),
            "add-file" => self.add_file(args),
            "add-text" => self.add_text(args),
            "extract" => self.extract(args),
            "delete" => self.delete(args),
            "lock" => self.lock(args, true),
            "unlock" => self.lock(args, false),
            "map" => match self.image() {
                Some(img) => map::draw_free_map(img),
                None => Ok(()),
            },
            "save" => self.save(args),
            _ => {
                println!("Unknown command: {}. Type 'help' for available commands.", command);
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("Error: {}", e);
        }
        Flow::Continue
    }

    fn open(&mut self, args: &[String]) -> Result<()> {
        let Some(path) = args.first() else {
            println!("Usage: open <path>");
            return Ok(());
        };
        let img = DiskImage::open(path)?;
        println!("Opened: {} ({})", path, img.geometry());
        self.image = Some(img);
        Ok(())
    }

    fn create(&mut self, args: &[String]) -> Result<()> {
        let mut builder = DiskImage::builder();
        if let Some(tracks) = args.first() {
            match tracks.parse() {
                Ok(tracks) => builder = builder.num_tracks(tracks),
                Err(_) => {
                    println!("Usage: create [tracks]");
                    return Ok(());
                }
            }
        }
        let img = builder.build()?;
        println!("Created new DOS 3.3 image ({})", img.geometry());
        self.image = Some(img);
        Ok(())
    }

    fn info(&self) -> Result<()> {
        let Some(img) = self.image() else {
            return Ok(());
        };
        print_info(img);

        let vtoc = Vtoc::load(img)?;
        println!("================ VTOC ======================");
        println!("{}", vtoc);
        let free = filesystem::bitmap::free_sector_count(img)?;
        println!("Free sectors: {} ({} KB)", free, free * img.geometry().sector_size as usize / 1024);
        Ok(())
    }

    fn catalog(&mut self) -> Result<()> {
        let Some(img) = self.image_mut() else {
            return Ok(());
        };
        let fs = Dos33FileSystem::mount(img)?;
        let info = fs.info()?;
        let entries = fs.read_dir_all()?;

        println!();
        println!("DISK VOLUME {:03}", info.volume);
        println!();
        if entries.is_empty() {
            println!("No files found.");
        }
        for entry in entries {
            println!("{}", entry);
        }
        println!();
        println!("{} files, {} sectors free", info.files, info.free_sectors);
        Ok(())
    }

    fn read_sector(&self, args: &[String]) -> Result<()> {
        let Some(img) = self.image() else {
            return Ok(());
        };
        let (Some(track), Some(sector)) = (
            args.first().and_then(|s| parse_number(s)),
            args.get(1).and_then(|s| parse_number(s)),
        ) else {
            println!("Usage: read-sector <track> <sector>");
            return Ok(());
        };
        let (Ok(track), Ok(sector)) = (u8::try_from(track), u8::try_from(sector)) else {
            println!("Usage: read-sector <track> <sector>");
            return Ok(());
        };

        let ts = TrackSector::new(track, sector);
        let data = img.read_sector(ts)?;
        println!("Sector {} at offset 0x{:05X}:", ts, img.sector_offset(ts)?);
        print_hex_dump(data, 256);
        Ok(())
    }

    fn tslist(&mut self, args: &[String]) -> Result<()> {
        let Some(name) = args.first() else {
            println!("Usage: tslist <name>");
            return Ok(());
        };
        let Some(img) = self.image_mut() else {
            return Ok(());
        };
        let fs = Dos33FileSystem::mount(img)?;
        for list in fs.ts_lists(name)? {
            print!("{}", list);
        }
        Ok(())
    }

    fn add_dos(&mut self, args: &[String]) -> Result<()> {
        let Some(path) = args.first() else {
            println!("Usage: add-dos <image>");
            return Ok(());
        };
        let Some(img) = self.image_mut() else {
            return Ok(());
        };
        let loader = std::fs::read(path)?;
        let mut fs = Dos33FileSystem::mount(img)?;
        let sectors = fs.add_system_loader(&loader)?;
        println!("Copied {} sectors from {}", sectors, path);
        Ok(())
    }

    fn add_file(&mut self, args: &[String]) -> Result<()> {
        let (Some(host), Some(name)) = (args.first(), args.get(1)) else {
            println!("Usage: add-file <host_path> <name> [load_address]");
            return Ok(());
        };
        let address = match args.get(2) {
            Some(s) => match parse_number(s).and_then(|n| u16::try_from(n).ok()) {
                Some(address) => address,
                None => {
                    println!("Invalid load address: {}", s);
                    return Ok(());
                }
            },
            None => DEFAULT_LOAD_ADDRESS,
        };
        let Some(img) = self.image_mut() else {
            return Ok(());
        };

        let data = std::fs::read(host)?;
        let mut fs = Dos33FileSystem::mount(img)?;
        fs.add_file(name, &data, address)?;
        println!("Added {} ({} bytes at ${:04X})", name.to_uppercase(), data.len(), address);
        Ok(())
    }

    fn add_text(&mut self, args: &[String]) -> Result<()> {
        let (Some(host), Some(name)) = (args.first(), args.get(1)) else {
            println!("Usage: add-text <host_path> <name>");
            return Ok(());
        };
        let Some(img) = self.image_mut() else {
            return Ok(());
        };

        let text = std::fs::read_to_string(host)?;
        let mut fs = Dos33FileSystem::mount(img)?;
        fs.add_text_file(name, &text)?;
        println!("Added {} ({} characters)", name.to_uppercase(), text.len());
        Ok(())
    }

    fn extract(&mut self, args: &[String]) -> Result<()> {
        let Some(name) = args.first() else {
            println!("Usage: extract <name> [output_path]");
            return Ok(());
        };
        let output = args.get(1).unwrap_or(name);
        let Some(img) = self.image_mut() else {
            return Ok(());
        };

        let fs = Dos33FileSystem::mount(img)?;
        let written = fs.extract_file(name, output)?;
        println!("Extracted {} to {} ({} bytes)", name.to_uppercase(), output, written);
        Ok(())
    }

    fn delete(&mut self, args: &[String]) -> Result<()> {
        let Some(name) = args.first() else {
            println!("Usage: delete <name>");
            return Ok(());
        };
        let Some(img) = self.image_mut() else {
            return Ok(());
        };

        let mut fs = Dos33FileSystem::mount(img)?;
        fs.delete_file(name)?;
        println!("Deleted {}", name.to_uppercase());
        Ok(())
    }

    fn lock(&mut self, args: &[String], locked: bool) -> Result<()> {
        let Some(name) = args.first() else {
            println!("Usage: {} <name>", if locked { "lock" } else { "unlock" });
            return Ok(());
        };
        let Some(img) = self.image_mut() else {
            return Ok(());
        };

        let mut fs = Dos33FileSystem::mount(img)?;
        fs.set_locked(name, locked)?;
        println!("{} {}", if locked { "Locked" } else { "Unlocked" }, name.to_uppercase());
        Ok(())
    }

    fn save(&mut self, args: &[String]) -> Result<()> {
        let Some(img) = self.image_mut() else {
            return Ok(());
        };
        let path = match args.first() {
            Some(path) => path.clone(),
            None => match img.filename() {
                Some(filename) => filename.to_string(),
                None => {
                    println!("Usage: save <path>");
                    return Ok(());
                }
            },
        };
        img.save(&path)?;
        println!("Saved: {}", path);
        Ok(())
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut session = Session { image: None };

    // One-shot mode: commands separated by ';' on the command line
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        let script = args.join(" ");
        for command in script.split(';') {
            let parts = parse_command_line(command);
            if parts.is_empty() {
                continue;
            }
            if let Flow::Quit = session.execute(&parts) {
                break;
            }
        }
        return;
    }

    println!("=== DOS33Manager ===");
    println!("Interactive console for exploring Apple II DOS 3.3 disk images.");
    println!("Type 'help' for available commands\n");

    let mut rl = match Editor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to create editor: {}", e);
            std::process::exit(1);
        }
    };
    rl.set_helper(Some(CommandCompleter::new()));

    // Load history if available
    if let Some(history_path) = history_path() {
        let _ = rl.load_history(&history_path);
    }

    loop {
        let readline = rl.readline("] ");
        let input = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let _ = rl.add_history_entry(input);

        let parts = parse_command_line(input);
        if parts.is_empty() {
            continue;
        }

        if let Flow::Quit = session.execute(&parts) {
            println!("Goodbye!");
            break;
        }
    }

    if let Some(history_path) = history_path() {
        let _ = rl.save_history(&history_path);
    }

    if session.image.as_ref().is_some_and(|img| img.is_changed()) {
        println!("Note: unsaved changes were discarded.");
    }
}

/// Parse command line input, respecting quoted strings
fn parse_command_line(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
            }
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    parts.push(current.clone());
                    current.clear();
                }
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

fn print_help() {
    println!("Available commands:");
    println!("  open <path>                    - Open a raw DOS 3.3 image (use quotes for paths with spaces)");
    println!("  create [tracks]                - Create a new initialized image (35 or 40 tracks)");
    println!("  info                           - Show image and VTOC information");
    println!("  cat                            - List the catalog, including deleted files");
    println!("  read-sector <track> <sector>   - Read and display a sector");
    println!("  tslist <name>                  - Show a file's track/sector lists");
    println!("  add-dos <image>                - Copy a system loader image onto the boot tracks");
    println!("  add-file <host> <name> [addr]  - Add a binary file (addr defaults to $0800)");
    println!("  add-text <host> <name>         - Add a text file");
    println!("  extract <name> [output_path]   - Export a file to the host filesystem");
    println!("  delete <name>                  - Delete a file");
    println!("  lock <name> / unlock <name>    - Set or clear a file's lock flag");
    println!("  map                            - Visual free sector map");
    println!("  save [path]                    - Save image to file");
    println!("  help                           - Show this help");
    println!("  quit, exit                     - Exit");
    println!();
    println!("Commands may also be given on the command line, separated by ';'.");
}

fn print_info(image: &DiskImage) {
    if let Some(filename) = image.filename() {
        println!("Filename: {}", filename);
    }
    let geometry = image.geometry();
    println!("Tracks: {}", geometry.tracks);
    println!("Sectors per track: {}", geometry.sectors_per_track);
    println!("Sector size: {} bytes", geometry.sector_size);
    println!("Total capacity: {} KB", image.total_capacity_kb());
    println!("Changed: {}", if image.is_changed() { "Yes" } else { "No" });
}

/// Hex dump with high-bit ASCII shown as plain characters
fn print_hex_dump(data: &[u8], max_bytes: usize) {
    let len = data.len().min(max_bytes);

    for (i, chunk) in data[..len].chunks(16).enumerate() {
        print!("{:04X}: ", i * 16);

        for (j, byte) in chunk.iter().enumerate() {
            print!("{:02X} ", byte);
            if j == 7 {
                print!(" ");
            }
        }

        // Pad if less than 16 bytes
        for j in chunk.len()..16 {
            print!("   ");
            if j == 7 {
                print!(" ");
            }
        }

        print!(" |");
        for byte in chunk {
            let ch = byte & 0x7F;
            let c = if (32..127).contains(&ch) { ch as char } else { '.' };
            print!("{}", c);
        }
        println!("|");
    }

    if data.len() > max_bytes {
        println!("... ({} more bytes)", data.len() - max_bytes);
    }
}

/// Parse a decimal, `0x` or `$` prefixed number
fn parse_number(s: &str) -> Option<u32> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = s.strip_prefix('$') {
        u32::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}
