use std::time::Duration;

use indoc::formatdoc;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ErrorData, Implementation, ServerCapabilities, ServerInfo},
    schemars::JsonSchema,
    tool, tool_handler, tool_router, ServerHandler,
};
use schemars::{json_schema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bridge::SimBridge;
use crate::errors::{DofSimError, DofSimResult};
use crate::reply::{JointState, OperationReply};
use crate::robots::{self, RobotSpec};
use crate::scripts::{self, BallSpec};
use crate::settings::Settings;

const DECODE_FAILURE: &str = "Failed to decode response from Isaac Sim";
const NO_ROBOTS: &str = "No robots found in simulation";

/// Parameters for the add_ground tool
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct AddGroundParams {
    /// Edge length of the square ground plane in metres (default 400)
    #[serde(default)]
    pub size: Option<f64>,
}

/// Parameters for the add_ball tool
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct AddBallParams {
    /// USD prim path of the sphere (default /World/InjectedSphere)
    #[serde(default)]
    pub prim_path: Option<String>,
    /// Sphere radius (default 6)
    #[serde(default)]
    pub radius: Option<f64>,
    /// Initial [x, y, z] position, only used when the sphere is created (default [0, 0, 20])
    #[serde(default)]
    pub translate: Option<[f64; 3]>,
}

/// Catalog keys as a string enum, with display names for hosts that render a picker.
fn robot_name_schema(_generator: &mut SchemaGenerator) -> Schema {
    let catalog = robots::all();
    json_schema!({
        "type": "string",
        "description": "Catalog key of the robot",
        "enum": catalog.iter().map(|spec| spec.key).collect::<Vec<_>>(),
        "enumTitles": catalog.iter().map(|spec| spec.name).collect::<Vec<_>>(),
    })
}

/// Parameters for tools that address a single robot
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RobotParams {
    #[schemars(schema_with = "robot_name_schema")]
    pub robot_name: String,
}

/// Parameters for the set_robot_positions tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SetPositionsParams {
    #[schemars(schema_with = "robot_name_schema")]
    pub robot_name: String,
    /// Target joint positions in radians
    pub positions: Vec<f64>,
}

/// Parameters for the set_robot_velocities tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SetVelocitiesParams {
    #[schemars(schema_with = "robot_name_schema")]
    pub robot_name: String,
    /// Target joint velocities in radians/second
    pub velocities: Vec<f64>,
}

/// MCP server exposing Isaac Sim scene and robot control as tools
#[derive(Clone)]
pub struct DofSimServer {
    tool_router: ToolRouter<Self>,
    instructions: String,
    name: String,
    bridge: SimBridge,
    settle_delay: Duration,
}

impl Default for DofSimServer {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

fn resolve_robot(name: &str) -> DofSimResult<&'static RobotSpec> {
    if name.trim().is_empty() {
        return Err(DofSimError::InvalidParameters(
            "Robot name must be specified".to_string(),
        ));
    }
    Ok(robots::lookup(name)?)
}

/// Fails when the script output is a reply that reports an error.
fn ensure_not_failed(output: &str, fallback: &str) -> DofSimResult<()> {
    match OperationReply::parse(output) {
        Some(reply) if !reply.is_success() => Err(DofSimError::Operation(reply.message_or(fallback))),
        _ => Ok(()),
    }
}

fn respond(tool: &str, result: DofSimResult<String>) -> Result<CallToolResult, ErrorData> {
    match result {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(e) if e.is_invalid_params() => {
            tracing::warn!(tool, "Rejected tool call: {}", e);
            Err(e.to_error_data())
        }
        Err(e) => {
            tracing::error!(tool, "Tool call failed: {}", e);
            Ok(CallToolResult::error(vec![Content::text(format!(
                "Error: {}",
                e
            ))]))
        }
    }
}

#[tool_router(router = tool_router)]
impl DofSimServer {
    pub fn new(settings: &Settings) -> Self {
        Self::with_bridge(
            SimBridge::from_settings(&settings.bridge),
            settings.settle_delay(),
            &settings.server_name,
        )
    }

    pub fn with_bridge(bridge: SimBridge, settle_delay: Duration, name: &str) -> Self {
        let robots = robots::all()
            .iter()
            .map(|spec| format!("- {}: {} ({})", spec.key, spec.name, spec.description))
            .collect::<Vec<_>>()
            .join("\n");

        let instructions = formatdoc! {r#"
            This extension drives a running NVIDIA Isaac Sim instance through its code-injection
            bridge at {addr}. Use it to build a scene and move robots inside it.

            Typical flow:
            1. add_ground to create a floor for physics interactions.
            2. add_robot with one of the robots below, optionally add_ball for a test object.
            3. list_robots to see which articulations are on the stage.
            4. get_robot_state, then set_robot_positions or set_robot_velocities. Joint vectors
               must contain one value per joint of the robot, in radians or radians/second.

            Available robots:
            {robots}
            "#,
            addr = bridge.addr(),
            robots = robots,
        };

        Self {
            tool_router: Self::tool_router(),
            instructions,
            name: name.to_string(),
            bridge,
            settle_delay,
        }
    }

    async fn settle(&self) {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
    }

    async fn run_add_ground(&self, params: AddGroundParams) -> DofSimResult<String> {
        let script = scripts::add_ground(params.size.unwrap_or(scripts::DEFAULT_GROUND_SIZE))?;
        tracing::info!("Adding ground plane...");
        self.settle().await;
        let output = self.bridge.exec(&script).await?;
        tracing::info!("Raw response from add_ground: {}", output);
        ensure_not_failed(&output, "Unknown error adding ground")?;
        Ok("Ground added to DOF simulation".to_string())
    }

    async fn run_add_ball(&self, params: AddBallParams) -> DofSimResult<String> {
        let defaults = BallSpec::default();
        let ball = BallSpec {
            prim_path: params.prim_path.unwrap_or(defaults.prim_path),
            radius: params.radius.unwrap_or(defaults.radius),
            translate: params.translate.unwrap_or(defaults.translate),
        };
        let script = scripts::add_ball(&ball)?;
        tracing::info!("Adding ball at {}...", ball.prim_path);
        self.settle().await;
        let output = self.bridge.exec(&script).await?;
        tracing::info!("Raw response from add_ball: {}", output);
        ensure_not_failed(&output, "Unknown error adding ball")?;
        Ok("Ball added to DOF simulation".to_string())
    }

    async fn run_add_robot(&self, params: RobotParams) -> DofSimResult<String> {
        let spec = resolve_robot(&params.robot_name)?;
        tracing::info!("Adding robot {}...", spec.key);
        self.settle().await;
        let output = self.bridge.exec(&scripts::add_robot(spec)).await?;
        tracing::info!("Raw response from add_robot: {}", output);
        ensure_not_failed(&output, "Unknown error adding robot")?;
        Ok(format!("{} added to DOF simulation", spec.name))
    }

    async fn run_list_robots(&self) -> DofSimResult<String> {
        tracing::info!("Listing robots...");
        let output = self.bridge.exec(&scripts::list_robots()).await?;
        tracing::info!("Raw response from list_robots: {}", output);

        let reply = OperationReply::parse(&output)
            .ok_or_else(|| DofSimError::Operation(DECODE_FAILURE.to_string()))?;
        if !reply.is_success() {
            return Err(DofSimError::Operation(
                reply.message_or("Unknown error listing robots"),
            ));
        }

        match &reply.data {
            Some(Value::Array(paths)) if paths.is_empty() => Ok(NO_ROBOTS.to_string()),
            Some(Value::Array(paths)) => {
                let paths = paths
                    .iter()
                    .map(|p| p.as_str().map(str::to_string).unwrap_or_else(|| p.to_string()))
                    .collect::<Vec<_>>();
                Ok(format!("Robots in simulation:\n{}", paths.join("\n")))
            }
            _ => Ok(reply.message_or(NO_ROBOTS)),
        }
    }

    async fn run_set_joints(
        &self,
        robot_name: &str,
        script: impl FnOnce(&RobotSpec) -> Result<String, scripts::ScriptError>,
        noun: &str,
        label: &str,
    ) -> DofSimResult<String> {
        let spec = resolve_robot(robot_name)?;
        let script = script(spec)?;
        tracing::info!("Setting {} for robot {}", noun, spec.key);
        let output = self.bridge.exec(&script).await?;
        tracing::info!("Raw response from set_joint_{}: {}", noun, output);

        let fallback = format!("{} set for {}", label, spec.key);
        match OperationReply::parse(&output) {
            None => Ok(fallback),
            Some(reply) if reply.is_success() => Ok(reply.message_or(&fallback)),
            Some(reply) => Err(DofSimError::Operation(
                reply.message_or(&format!("Unknown error setting {}", noun)),
            )),
        }
    }

    async fn run_get_robot_state(&self, params: RobotParams) -> DofSimResult<String> {
        let spec = resolve_robot(&params.robot_name)?;
        tracing::info!("Getting state for robot {}", spec.key);
        let output = self.bridge.exec(&scripts::get_joint_states(spec)).await?;
        tracing::info!("Raw response from get_joint_states: {}", output);

        let reply = OperationReply::parse(&output)
            .ok_or_else(|| DofSimError::Operation(DECODE_FAILURE.to_string()))?;
        if !reply.is_success() {
            return Err(DofSimError::Operation(
                reply.message_or("Unknown error getting state"),
            ));
        }

        let state: JointState = reply
            .data
            .and_then(|data| serde_json::from_value(data).ok())
            .ok_or_else(|| DofSimError::Operation("No joint state received from Isaac Sim".to_string()))?;

        Ok(format!(
            "Robot {} state:\nPositions: {}\nVelocities: {}",
            spec.key, state.positions, state.velocities
        ))
    }

    /// Add a ground plane to the stage
    #[tool(
        name = "add_ground",
        description = "Add ground plane to Isaac Sim DOF simulation"
    )]
    pub async fn add_ground(
        &self,
        params: Parameters<AddGroundParams>,
    ) -> Result<CallToolResult, ErrorData> {
        respond("add_ground", self.run_add_ground(params.0).await)
    }

    /// Add or update a sphere prim
    #[tool(
        name = "add_ball",
        description = "Add ball object to Isaac Sim DOF simulation"
    )]
    pub async fn add_ball(
        &self,
        params: Parameters<AddBallParams>,
    ) -> Result<CallToolResult, ErrorData> {
        respond("add_ball", self.run_add_ball(params.0).await)
    }

    /// Reference a catalog robot into the stage
    #[tool(
        name = "add_robot",
        description = "Add robot to Isaac Sim DOF simulation"
    )]
    pub async fn add_robot(
        &self,
        params: Parameters<RobotParams>,
    ) -> Result<CallToolResult, ErrorData> {
        respond("add_robot", self.run_add_robot(params.0).await)
    }

    #[tool(
        name = "list_robots",
        description = "List all robots currently in the simulation"
    )]
    pub async fn list_robots(&self) -> Result<CallToolResult, ErrorData> {
        respond("list_robots", self.run_list_robots().await)
    }

    #[tool(
        name = "set_robot_positions",
        description = "Set joint positions for a robot"
    )]
    pub async fn set_robot_positions(
        &self,
        params: Parameters<SetPositionsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let params = params.0;
        let result = self
            .run_set_joints(
                &params.robot_name,
                |spec| scripts::set_joint_positions(spec, &params.positions),
                "positions",
                "Positions",
            )
            .await;
        respond("set_robot_positions", result)
    }

    #[tool(
        name = "set_robot_velocities",
        description = "Set joint velocities for a robot"
    )]
    pub async fn set_robot_velocities(
        &self,
        params: Parameters<SetVelocitiesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let params = params.0;
        let result = self
            .run_set_joints(
                &params.robot_name,
                |spec| scripts::set_joint_velocities(spec, &params.velocities),
                "velocities",
                "Velocities",
            )
            .await;
        respond("set_robot_velocities", result)
    }

    #[tool(
        name = "get_robot_state",
        description = "Get current joint positions and velocities of a robot"
    )]
    pub async fn get_robot_state(
        &self,
        params: Parameters<RobotParams>,
    ) -> Result<CallToolResult, ErrorData> {
        respond("get_robot_state", self.run_get_robot_state(params.0).await)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for DofSimServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = self.name.clone();
        server_info.version = env!("CARGO_PKG_VERSION").to_owned();

        ServerInfo {
            server_info,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(self.instructions.clone()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::ErrorCode;

    fn offline_server() -> DofSimServer {
        // Port 9 (discard) on localhost is expected to refuse connections.
        DofSimServer::with_bridge(SimBridge::new("127.0.0.1", 9), Duration::ZERO, "dof-sim")
    }

    #[test]
    fn test_get_info() {
        let server = offline_server();
        let info = server.get_info();

        assert_eq!(info.server_info.name, "dof-sim");
        assert!(info.capabilities.tools.is_some());
        let instructions = info.instructions.unwrap();
        assert!(instructions.contains("127.0.0.1:9"));
        assert!(instructions.contains("- franka: Franka Emika Panda"));
        assert!(instructions.contains("- digit: Agility Robotics Digit"));
    }

    #[test]
    fn test_registers_all_tools() {
        let server = offline_server();
        let mut names = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect::<Vec<_>>();
        names.sort();
        assert_eq!(
            names,
            vec![
                "add_ball",
                "add_ground",
                "add_robot",
                "get_robot_state",
                "list_robots",
                "set_robot_positions",
                "set_robot_velocities",
            ]
        );
    }

    #[test]
    fn test_robot_name_schema_lists_catalog() {
        let server = offline_server();
        let tools = server.tool_router.list_all();
        for tool_name in [
            "add_robot",
            "get_robot_state",
            "set_robot_positions",
            "set_robot_velocities",
        ] {
            let tool = tools
                .iter()
                .find(|tool| tool.name == tool_name)
                .unwrap();
            let schema = Value::Object((*tool.input_schema).clone());
            let robot_name = &schema["properties"]["robot_name"];

            assert_eq!(robot_name["type"], "string", "{}", tool_name);
            assert_eq!(robot_name["enum"], serde_json::json!(robots::keys()));
            assert_eq!(robot_name["enumTitles"][0], "Franka Emika Panda");
            let required = schema["required"].as_array().unwrap();
            assert!(required.contains(&Value::from("robot_name")), "{}", tool_name);
        }
    }

    #[tokio::test]
    async fn test_unknown_robot_is_invalid_params() {
        let server = offline_server();
        let err = server
            .add_robot(Parameters(RobotParams {
                robot_name: "atlas".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("Available robots"));
    }

    #[tokio::test]
    async fn test_empty_robot_name_is_invalid_params() {
        let server = offline_server();
        let err = server
            .get_robot_state(Parameters(RobotParams {
                robot_name: "  ".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(err.message, "Invalid parameters: Robot name must be specified");
    }

    #[tokio::test]
    async fn test_empty_joint_vector_is_invalid_params() {
        let server = offline_server();
        let err = server
            .set_robot_positions(Parameters(SetPositionsParams {
                robot_name: "franka".to_string(),
                positions: vec![],
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_unreachable_bridge_is_tool_error() {
        let server = offline_server();
        let result = server
            .add_ground(Parameters(AddGroundParams::default()))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let text = &result.content[0].as_text().unwrap().text;
        assert!(text.starts_with("Error: "), "unexpected text: {}", text);
    }
}
