//! MCP tool handlers for the Bedrock console

use bedrock_core::{BedrockError, Result, ServerStatus};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::commands::{self, BuildingKind, Pos, fmt_num};
use crate::console::ConsoleServer;
use crate::mcp::{RequestId, Response};

/// Pause between the commands of a building plan
const BUILD_STEP_DELAY: Duration = Duration::from_millis(100);

/// Lines returned by get-server-logs when the caller does not say
const DEFAULT_LOG_LINES: f64 = 20.0;

/// Tool definition for MCP tools/list
#[derive(Debug, Clone, Serialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

fn tool(name: &str, description: &str, input_schema: serde_json::Value) -> ToolDef {
    ToolDef {
        name: name.into(),
        description: description.into(),
        input_schema,
    }
}

fn xyz_properties(label: &str) -> serde_json::Value {
    serde_json::json!({
        "x": {"type": "number", "description": format!("{label}X coordinate")},
        "y": {"type": "number", "description": format!("{label}Y coordinate")},
        "z": {"type": "number", "description": format!("{label}Z coordinate")}
    })
}

fn box_properties() -> serde_json::Value {
    serde_json::json!({
        "x1": {"type": "number", "description": "First corner X coordinate"},
        "y1": {"type": "number", "description": "First corner Y coordinate"},
        "z1": {"type": "number", "description": "First corner Z coordinate"},
        "x2": {"type": "number", "description": "Second corner X coordinate"},
        "y2": {"type": "number", "description": "Second corner Y coordinate"},
        "z2": {"type": "number", "description": "Second corner Z coordinate"}
    })
}

fn object_schema(
    mut properties: serde_json::Value,
    extra: serde_json::Value,
    required: &[&str],
) -> serde_json::Value {
    if let (Some(props), Some(extra)) = (properties.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            props.insert(k.clone(), v.clone());
        }
    }
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// Get list of available tools
pub fn list_tools() -> Vec<ToolDef> {
    let none = serde_json::json!({});
    vec![
        tool(
            "start-server",
            "Start the Minecraft Bedrock server process if it is not already running",
            object_schema(none.clone(), none.clone(), &[]),
        ),
        tool(
            "stop-server",
            "Stop the Minecraft Bedrock server (sends 'stop', then terminates after a grace period)",
            object_schema(none.clone(), none.clone(), &[]),
        ),
        tool(
            "send-command",
            "Send a command to the Minecraft Bedrock server",
            object_schema(
                serde_json::json!({
                    "command": {
                        "type": "string",
                        "description": "The Minecraft command to send (without leading slash)"
                    }
                }),
                none.clone(),
                &["command"],
            ),
        ),
        tool(
            "get-server-status",
            "Get the current status of the Minecraft server",
            object_schema(none.clone(), none.clone(), &[]),
        ),
        tool(
            "list-players",
            "List players currently online",
            object_schema(none.clone(), none.clone(), &[]),
        ),
        tool(
            "get-server-logs",
            "Get recent server logs",
            object_schema(
                serde_json::json!({
                    "lines": {
                        "type": "number",
                        "description": "Number of recent log lines to retrieve"
                    }
                }),
                none.clone(),
                &[],
            ),
        ),
        tool(
            "teleport-player",
            "Teleport a player to specific coordinates",
            object_schema(
                xyz_properties(""),
                serde_json::json!({
                    "player": {"type": "string", "description": "Player name to teleport"}
                }),
                &["player", "x", "y", "z"],
            ),
        ),
        tool(
            "give-item",
            "Give an item to a player",
            object_schema(
                serde_json::json!({
                    "player": {"type": "string", "description": "Player name to give item to"},
                    "item": {
                        "type": "string",
                        "description": "Item ID (e.g., 'diamond_sword', 'stone', 'apple')"
                    },
                    "amount": {"type": "number", "description": "Amount of items to give"}
                }),
                none.clone(),
                &["player", "item"],
            ),
        ),
        tool(
            "set-time",
            "Set the time of day in the world",
            object_schema(
                serde_json::json!({
                    "time": {
                        "type": "string",
                        "description": "Time to set ('day', 'night', 'noon', 'midnight', or tick value)"
                    }
                }),
                none.clone(),
                &["time"],
            ),
        ),
        tool(
            "set-weather",
            "Change the weather in the world",
            object_schema(
                serde_json::json!({
                    "weather": {
                        "type": "string",
                        "description": "Weather type ('clear', 'rain', 'thunder')"
                    },
                    "duration": {"type": "number", "description": "Duration in seconds (optional)"}
                }),
                none.clone(),
                &["weather"],
            ),
        ),
        tool(
            "setblock",
            "Place a single block at specific coordinates",
            object_schema(
                xyz_properties(""),
                serde_json::json!({
                    "block": {
                        "type": "string",
                        "description": "Block type (e.g., 'stone', 'oak_planks', 'glass', 'dirt')"
                    }
                }),
                &["x", "y", "z", "block"],
            ),
        ),
        tool(
            "fill",
            "Fill a rectangular area with blocks",
            object_schema(
                box_properties(),
                serde_json::json!({
                    "block": {
                        "type": "string",
                        "description": "Block type to fill with (e.g., 'stone', 'air', 'water')"
                    },
                    "fill_mode": {
                        "type": "string",
                        "description": "Fill mode ('replace', 'destroy', 'keep', 'outline', 'hollow')"
                    }
                }),
                &["x1", "y1", "z1", "x2", "y2", "z2", "block"],
            ),
        ),
        tool(
            "clone",
            "Copy blocks from one area to another",
            object_schema(
                box_properties(),
                serde_json::json!({
                    "dest_x": {"type": "number", "description": "Destination X coordinate"},
                    "dest_y": {"type": "number", "description": "Destination Y coordinate"},
                    "dest_z": {"type": "number", "description": "Destination Z coordinate"}
                }),
                &["x1", "y1", "z1", "x2", "y2", "z2", "dest_x", "dest_y", "dest_z"],
            ),
        ),
        tool(
            "structure-save",
            "Save a structure template from the world",
            object_schema(
                box_properties(),
                serde_json::json!({
                    "name": {"type": "string", "description": "Name for the structure template"}
                }),
                &["name", "x1", "y1", "z1", "x2", "y2", "z2"],
            ),
        ),
        tool(
            "structure-load",
            "Load and place a saved structure template",
            object_schema(
                xyz_properties("Placement "),
                serde_json::json!({
                    "name": {"type": "string", "description": "Name of the structure template to load"}
                }),
                &["name", "x", "y", "z"],
            ),
        ),
        tool(
            "summon",
            "Spawn entities (mobs, items, etc.) at specific coordinates",
            object_schema(
                xyz_properties(""),
                serde_json::json!({
                    "entity": {
                        "type": "string",
                        "description": "Entity type (e.g., 'cow', 'zombie', 'armor_stand', 'item')"
                    }
                }),
                &["entity", "x", "y", "z"],
            ),
        ),
        tool(
            "particle",
            "Create particle effects at specific locations",
            object_schema(
                xyz_properties(""),
                serde_json::json!({
                    "particle_type": {
                        "type": "string",
                        "description": "Particle type (e.g., 'flame', 'smoke', 'heart', 'explosion')"
                    }
                }),
                &["particle_type", "x", "y", "z"],
            ),
        ),
        tool(
            "create-simple-building",
            "Create common building structures like houses, towers, or walls",
            object_schema(
                xyz_properties("Center/start "),
                serde_json::json!({
                    "structure_type": {
                        "type": "string",
                        "description": "Type of structure ('house', 'tower', 'wall', 'platform', 'pyramid')",
                        "enum": ["house", "tower", "wall", "platform", "pyramid"]
                    },
                    "size": {
                        "type": "number",
                        "description": "Size parameter (width/height depending on structure)",
                        "minimum": 1,
                        "maximum": 64
                    },
                    "material": {
                        "type": "string",
                        "description": "Primary building material (e.g., 'stone', 'oak_planks', 'cobblestone')"
                    }
                }),
                &["structure_type", "x", "y", "z", "size"],
            ),
        ),
    ]
}

/// Text result of a tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn failed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "content": [{ "type": "text", "text": self.text }],
            "isError": self.is_error
        })
    }
}

/// A string or a bare number, as callers send either for `time`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(f64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Number(n) => f.write_str(&fmt_num(*n)),
        }
    }
}

/// Parameters for send-command
#[derive(Debug, Deserialize)]
pub struct SendCommandParams {
    #[serde(default)]
    pub command: String,
}

/// Parameters for get-server-logs
#[derive(Debug, Deserialize)]
pub struct ServerLogsParams {
    #[serde(default = "default_log_lines")]
    pub lines: f64,
}

fn default_log_lines() -> f64 {
    DEFAULT_LOG_LINES
}

/// Coordinates shared by the single-position tools
#[derive(Debug, Deserialize)]
pub struct XyzParams {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl XyzParams {
    fn pos(&self) -> Pos {
        Pos::new(self.x, self.y, self.z)
    }
}

/// Corners shared by the area tools
#[derive(Debug, Deserialize)]
pub struct BoxParams {
    pub x1: f64,
    pub y1: f64,
    pub z1: f64,
    pub x2: f64,
    pub y2: f64,
    pub z2: f64,
}

impl BoxParams {
    fn first(&self) -> Pos {
        Pos::new(self.x1, self.y1, self.z1)
    }

    fn second(&self) -> Pos {
        Pos::new(self.x2, self.y2, self.z2)
    }
}

/// Parameters for teleport-player
#[derive(Debug, Deserialize)]
pub struct TeleportParams {
    pub player: String,
    #[serde(flatten)]
    pub at: XyzParams,
}

/// Parameters for give-item
#[derive(Debug, Deserialize)]
pub struct GiveItemParams {
    pub player: String,
    pub item: String,
    #[serde(default = "default_amount")]
    pub amount: f64,
}

fn default_amount() -> f64 {
    1.0
}

/// Parameters for set-time
#[derive(Debug, Deserialize)]
pub struct SetTimeParams {
    pub time: Scalar,
}

/// Parameters for set-weather
#[derive(Debug, Deserialize)]
pub struct SetWeatherParams {
    pub weather: String,
    pub duration: Option<f64>,
}

/// Parameters for setblock
#[derive(Debug, Deserialize)]
pub struct SetBlockParams {
    #[serde(flatten)]
    pub at: XyzParams,
    pub block: String,
}

/// Parameters for fill
#[derive(Debug, Deserialize)]
pub struct FillParams {
    #[serde(flatten)]
    pub area: BoxParams,
    pub block: String,
    #[serde(default = "default_fill_mode")]
    pub fill_mode: String,
}

fn default_fill_mode() -> String {
    "replace".to_string()
}

/// Parameters for clone
#[derive(Debug, Deserialize)]
pub struct CloneParams {
    #[serde(flatten)]
    pub area: BoxParams,
    pub dest_x: f64,
    pub dest_y: f64,
    pub dest_z: f64,
}

/// Parameters for structure-save
#[derive(Debug, Deserialize)]
pub struct StructureSaveParams {
    pub name: String,
    #[serde(flatten)]
    pub area: BoxParams,
}

/// Parameters for structure-load
#[derive(Debug, Deserialize)]
pub struct StructureLoadParams {
    pub name: String,
    #[serde(flatten)]
    pub at: XyzParams,
}

/// Parameters for summon
#[derive(Debug, Deserialize)]
pub struct SummonParams {
    pub entity: String,
    #[serde(flatten)]
    pub at: XyzParams,
}

/// Parameters for particle
#[derive(Debug, Deserialize)]
pub struct ParticleParams {
    pub particle_type: String,
    #[serde(flatten)]
    pub at: XyzParams,
}

/// Parameters for create-simple-building
#[derive(Debug, Deserialize)]
pub struct BuildingParams {
    pub structure_type: String,
    #[serde(flatten)]
    pub at: XyzParams,
    pub size: f64,
    #[serde(default = "default_material")]
    pub material: String,
}

fn default_material() -> String {
    "stone".to_string()
}

fn parse<T: DeserializeOwned>(params: serde_json::Value) -> Result<T> {
    let params = if params.is_null() {
        serde_json::json!({})
    } else {
        params
    };
    serde_json::from_value(params).map_err(|e| BedrockError::InvalidArguments(e.to_string()))
}

fn coords(p: Pos) -> String {
    format!("({}, {}, {})", fmt_num(p.x), fmt_num(p.y), fmt_num(p.z))
}

fn compact(p: Pos) -> String {
    format!("({},{},{})", fmt_num(p.x), fmt_num(p.y), fmt_num(p.z))
}

/// Handle a tools/call request
pub async fn handle_tool_call<S: ConsoleServer>(
    name: &str,
    params: serde_json::Value,
    id: RequestId,
    console: &Arc<S>,
) -> Response {
    info!("Tool call: {} with {}", name, params);

    let output = match dispatch(name, params, console).await {
        Ok(output) => output,
        Err(e) => {
            error!("Error executing {}: {}", name, e);
            ToolOutput::failed(format!("Error executing {}: {}", name, e))
        }
    };

    Response::success(id, output.to_json())
}

async fn dispatch<S: ConsoleServer>(
    name: &str,
    params: serde_json::Value,
    console: &Arc<S>,
) -> Result<ToolOutput> {
    match name {
        "start-server" => handle_start(console).await,
        "stop-server" => {
            console.stop().await;
            Ok(ToolOutput::ok("Bedrock server stopped"))
        }
        "send-command" => {
            let p: SendCommandParams = parse(params)?;
            Ok(relay(console, &p.command, format!("Command sent: {}", p.command)).await)
        }
        "get-server-status" => Ok(ToolOutput::ok(status_text(&console.status().await))),
        "list-players" => Ok(ToolOutput::ok(players_text(&console.status().await))),
        "get-server-logs" => {
            let p: ServerLogsParams = parse(params)?;
            if !p.lines.is_finite() || p.lines < 0.0 {
                return Err(BedrockError::InvalidArguments(format!(
                    "lines must be a non-negative number, got {}",
                    p.lines
                )));
            }
            let logs = console.recent_logs(p.lines as usize).await;
            Ok(ToolOutput::ok(format!(
                "Recent server logs ({} lines):\n\n{}",
                logs.len(),
                logs.join("\n")
            )))
        }
        "teleport-player" => {
            let p: TeleportParams = parse(params)?;
            let command = commands::teleport(&p.player, p.at.pos());
            let summary = format!("Teleported {} to {}", p.player, coords(p.at.pos()));
            Ok(relay(console, &command, summary).await)
        }
        "give-item" => {
            let p: GiveItemParams = parse(params)?;
            let command = commands::give(&p.player, &p.item, p.amount);
            let summary = format!("Gave {} {} to {}", fmt_num(p.amount), p.item, p.player);
            Ok(relay(console, &command, summary).await)
        }
        "set-time" => {
            let p: SetTimeParams = parse(params)?;
            let time = p.time.to_string();
            let summary = format!("Set time to {}", time);
            Ok(relay(console, &commands::time_set(&time), summary).await)
        }
        "set-weather" => {
            let p: SetWeatherParams = parse(params)?;
            let command = commands::weather(&p.weather, p.duration);
            let summary = format!("Set weather to {}", p.weather);
            Ok(relay(console, &command, summary).await)
        }
        "setblock" => {
            let p: SetBlockParams = parse(params)?;
            let command = commands::setblock(p.at.pos(), &p.block);
            let summary = format!("Placed {} at {}", p.block, coords(p.at.pos()));
            Ok(relay(console, &command, summary).await)
        }
        "fill" => {
            let p: FillParams = parse(params)?;
            let (a, b) = (p.area.first(), p.area.second());
            let command = commands::fill(a, b, &p.block, Some(&p.fill_mode));
            let summary = format!(
                "Filled area from {} to {} with {}",
                compact(a),
                compact(b),
                p.block
            );
            Ok(relay(console, &command, summary).await)
        }
        "clone" => {
            let p: CloneParams = parse(params)?;
            let dest = Pos::new(p.dest_x, p.dest_y, p.dest_z);
            let command = commands::clone(p.area.first(), p.area.second(), dest);
            let summary = format!(
                "Cloned area from {}-{} to {}",
                compact(p.area.first()),
                compact(p.area.second()),
                compact(dest)
            );
            Ok(relay(console, &command, summary).await)
        }
        "structure-save" => {
            let p: StructureSaveParams = parse(params)?;
            let (a, b) = (p.area.first(), p.area.second());
            let command = commands::structure_save(&p.name, a, b);
            let summary = format!(
                "Saved structure '{}' from {} to {}",
                p.name,
                compact(a),
                compact(b)
            );
            Ok(relay(console, &command, summary).await)
        }
        "structure-load" => {
            let p: StructureLoadParams = parse(params)?;
            let command = commands::structure_load(&p.name, p.at.pos());
            let summary = format!("Loaded structure '{}' at {}", p.name, coords(p.at.pos()));
            Ok(relay(console, &command, summary).await)
        }
        "summon" => {
            let p: SummonParams = parse(params)?;
            let command = commands::summon(&p.entity, p.at.pos());
            let summary = format!("Summoned {} at {}", p.entity, coords(p.at.pos()));
            Ok(relay(console, &command, summary).await)
        }
        "particle" => {
            let p: ParticleParams = parse(params)?;
            let command = commands::particle(&p.particle_type, p.at.pos());
            let summary = format!(
                "Created {} particles at {}",
                p.particle_type,
                coords(p.at.pos())
            );
            Ok(relay(console, &command, summary).await)
        }
        "create-simple-building" => {
            let p: BuildingParams = parse(params)?;
            handle_building(p, console).await
        }
        _ => Ok(ToolOutput::failed(format!("Unknown tool: {}", name))),
    }
}

async fn handle_start<S: ConsoleServer>(console: &Arc<S>) -> Result<ToolOutput> {
    console.start().await?;
    let status = console.status().await;
    Ok(ToolOutput::ok(format!(
        "Bedrock server running (Process ID: {})",
        pid_text(status.pid)
    )))
}

/// Send one command and frame its inferred response under `summary`
async fn relay<S: ConsoleServer>(console: &Arc<S>, command: &str, summary: String) -> ToolOutput {
    match console.send(command).await {
        Ok(telemetry) => ToolOutput::ok(format!(
            "{}\n\nServer response:\n{}",
            summary,
            telemetry.response_text()
        )),
        Err(e) => ToolOutput::failed(format!("{}\n\nServer response:\n{}", summary, e)),
    }
}

async fn handle_building<S: ConsoleServer>(
    p: BuildingParams,
    console: &Arc<S>,
) -> Result<ToolOutput> {
    let kind: BuildingKind = p.structure_type.parse()?;
    let origin = p.at.pos();
    let plan = commands::building_plan(kind, origin, p.size, &p.material)?;

    let mut last = None;
    let mut any_failed = false;
    for command in &plan {
        match console.send(command).await {
            Ok(telemetry) => last = Some(telemetry.response_text()),
            Err(e) => {
                any_failed = true;
                last = Some(e.to_string());
            }
        }
        tokio::time::sleep(BUILD_STEP_DELAY).await;
    }

    let text = format!(
        "Built {} at {} with size {} using {}\n\nExecuted {} commands\n\nFinal result:\n{}",
        kind,
        coords(origin),
        fmt_num(p.size),
        p.material,
        plan.len(),
        last.as_deref().unwrap_or("No commands executed")
    );
    Ok(if any_failed {
        ToolOutput::failed(text)
    } else {
        ToolOutput::ok(text)
    })
}

fn pid_text(pid: Option<u32>) -> String {
    pid.map(|p| p.to_string()).unwrap_or_else(|| "None".to_string())
}

/// Render the get-server-status tool text
pub fn status_text(status: &ServerStatus) -> String {
    let players = if status.player_list.is_empty() {
        "None".to_string()
    } else {
        status.player_list.join(", ")
    };
    format!(
        "Server Status:\n- Running: {}\n- Players Online: {}\n- Process ID: {}\n\nPlayers: {}",
        status.running,
        status.player_count,
        pid_text(status.pid),
        players
    )
}

/// Render the list-players tool text
pub fn players_text(status: &ServerStatus) -> String {
    if status.player_list.is_empty() {
        return "No players currently online".to_string();
    }
    let lines: Vec<String> = status
        .player_list
        .iter()
        .map(|p| format!("- {}", p))
        .collect();
    format!(
        "Players online ({}):\n{}",
        status.player_list.len(),
        lines.join("\n")
    )
}
