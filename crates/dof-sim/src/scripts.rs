//! Python snippets executed by the Isaac Sim code-injection bridge.
//!
//! Every builder except [`add_robot`] produces a script that prints a single
//! JSON object of the form `{"status": "success" | "error", ...}` on stdout.
//! Values coming from tool arguments are rendered as Python literals, never
//! spliced in raw.

use indoc::{formatdoc, indoc};
use serde_json::Value;
use thiserror::Error;

use crate::robots::RobotSpec;

pub const DEFAULT_GROUND_SIZE: f64 = 400.0;
pub const GROUND_PRIM_PATH: &str = "/World/GroundPlane";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("Prim path '{0}' must be an absolute USD path starting with '/'")]
    RelativePrimPath(String),
    #[error("{0} must contain at least one value")]
    EmptyJointVector(&'static str),
}

/// Sphere prim created or updated by [`add_ball`].
#[derive(Debug, Clone, PartialEq)]
pub struct BallSpec {
    pub prim_path: String,
    pub radius: f64,
    pub translate: [f64; 3],
}

impl Default for BallSpec {
    fn default() -> Self {
        Self {
            prim_path: "/World/InjectedSphere".to_string(),
            radius: 6.0,
            translate: [0.0, 0.0, 20.0],
        }
    }
}

fn py_str(value: &str) -> String {
    // A JSON string literal is also a valid Python string literal.
    Value::String(value.to_string()).to_string()
}

fn py_float(field: &'static str, value: f64) -> Result<String, ScriptError> {
    if !value.is_finite() {
        return Err(ScriptError::NonFinite { field, value });
    }
    Ok(format!("{:?}", value))
}

fn py_positive(field: &'static str, value: f64) -> Result<String, ScriptError> {
    let rendered = py_float(field, value)?;
    if value <= 0.0 {
        return Err(ScriptError::NotPositive { field, value });
    }
    Ok(rendered)
}

fn py_float_list(field: &'static str, values: &[f64]) -> Result<String, ScriptError> {
    if values.is_empty() {
        return Err(ScriptError::EmptyJointVector(field));
    }
    let rendered = values
        .iter()
        .map(|v| py_float(field, *v))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("[{}]", rendered.join(", ")))
}

fn checked_prim_path(path: &str) -> Result<String, ScriptError> {
    if !path.starts_with('/') {
        return Err(ScriptError::RelativePrimPath(path.to_string()));
    }
    Ok(py_str(path))
}

/// Square ground mesh of `size` x `size` metres at Z = 0, replacing any previous plane.
pub fn add_ground(size: f64) -> Result<String, ScriptError> {
    py_positive("size", size)?;
    let extent = py_float("size", size / 2.0)?;
    Ok(formatdoc! {r#"
        import omni.usd
        from pxr import UsdGeom
        import json

        try:
            ctx = omni.usd.get_context()
            stage = ctx.get_stage() or ctx.new_stage()

            path = {path}
            if stage.GetPrimAtPath(path):
                stage.RemovePrim(path)

            plane = UsdGeom.Mesh.Define(stage, path)
            extent = {extent}
            plane.CreatePointsAttr([
                (-extent, -extent, 0), (extent, -extent, 0),
                (extent, extent, 0), (-extent, extent, 0)
            ])
            plane.CreateFaceVertexCountsAttr([4])
            plane.CreateFaceVertexIndicesAttr([0, 1, 2, 3])
            ctx.wait_for_idle()

            print(json.dumps({{"status": "success", "message": "Ground plane added successfully"}}))
        except Exception as e:
            print(json.dumps({{"status": "error", "message": str(e)}}))
        "#,
        path = py_str(GROUND_PRIM_PATH),
        extent = extent,
    })
}

/// References the robot's USD asset at its prim path. Prints plain text rather than JSON.
pub fn add_robot(spec: &RobotSpec) -> String {
    formatdoc! {r#"
        import omni.usd

        ctx = omni.usd.get_context()
        stage = ctx.get_stage() or ctx.new_stage()

        prim_path = {prim_path}
        if stage.GetPrimAtPath(prim_path):
            stage.RemovePrim(prim_path)

        stage.DefinePrim(prim_path, "Xform").GetReferences().AddReference({usd_path})

        ctx.wait_for_idle()
        print({confirmation})
        "#,
        prim_path = py_str(spec.prim_path),
        usd_path = py_str(&spec.usd_path()),
        confirmation = py_str(&format!("Robot {} referenced from {}", spec.name, spec.usd_path())),
    }
}

pub fn add_ball(ball: &BallSpec) -> Result<String, ScriptError> {
    let prim_path = checked_prim_path(&ball.prim_path)?;
    let radius = py_positive("radius", ball.radius)?;
    let [x, y, z] = ball.translate;
    let (x, y, z) = (
        py_float("translate", x)?,
        py_float("translate", y)?,
        py_float("translate", z)?,
    );
    let done = py_str(&format!(
        "Ball added/updated successfully at {}",
        ball.prim_path
    ));

    Ok(formatdoc! {r#"
        import omni.usd, omni.timeline, omni.kit.app
        from pxr import UsdGeom, Gf
        import json

        try:
            ctx = omni.usd.get_context()
            stage = ctx.get_stage() or ctx.new_stage()
            prim_path = {prim_path}

            if not stage.GetPrimAtPath(prim_path):
                sphere = UsdGeom.Sphere.Define(stage, prim_path)
                sphere.GetRadiusAttr().Set({radius})
                sphere.AddTranslateOp().Set(Gf.Vec3f({x}, {y}, {z}))
            else:
                sphere = UsdGeom.Sphere(stage.GetPrimAtPath(prim_path))
                sphere.GetRadiusAttr().Set({radius})

            timeline = omni.timeline.get_timeline_interface()
            timeline.play()
            omni.kit.app.get_app().update()
            timeline.stop()
            ctx.wait_for_idle()

            print(json.dumps({{"status": "success", "message": {done}}}))
        except Exception as e:
            print(json.dumps({{"status": "error", "message": str(e)}}))
        "#,
        prim_path = prim_path,
        radius = radius,
        x = x,
        y = y,
        z = z,
        done = done,
    })
}

fn articulation_script(spec: &RobotSpec, body: &str) -> String {
    formatdoc! {r#"
        from omni.isaac.core.articulations import ArticulationView
        import json

        try:
            robot = ArticulationView(prim_paths_expr={prim_path}, name={name})
            robot.initialize()
        {body}
        except Exception as e:
            result = {{"status": "error", "message": str(e)}}

        print(json.dumps(result))
        "#,
        prim_path = py_str(spec.prim_path),
        name = py_str(spec.key),
        body = body,
    }
}

pub fn set_joint_positions(spec: &RobotSpec, positions: &[f64]) -> Result<String, ScriptError> {
    let positions = py_float_list("positions", positions)?;
    let message = py_str(&format!("Set joint positions for {}", spec.key));
    let body = format!(
        "    robot.set_joint_positions(positions={positions})\n    result = {{\"status\": \"success\", \"message\": {message}}}"
    );
    Ok(articulation_script(spec, &body))
}

pub fn set_joint_velocities(spec: &RobotSpec, velocities: &[f64]) -> Result<String, ScriptError> {
    let velocities = py_float_list("velocities", velocities)?;
    let message = py_str(&format!("Set joint velocities for {}", spec.key));
    let body = format!(
        "    robot.set_joint_velocities(velocities={velocities})\n    result = {{\"status\": \"success\", \"message\": {message}}}"
    );
    Ok(articulation_script(spec, &body))
}

pub fn get_joint_states(spec: &RobotSpec) -> String {
    let body = concat!(
        "    positions = robot.get_joint_positions().tolist()\n",
        "    velocities = robot.get_joint_velocities().tolist()\n",
        "    result = {\"status\": \"success\", \"data\": {\"positions\": positions, \"velocities\": velocities}}",
    );
    articulation_script(spec, body)
}

/// Paths of every articulation root on the current stage.
pub fn list_robots() -> String {
    indoc! {r#"
        import omni.usd
        import omni.kit.app
        from pxr import UsdPhysics
        import json
        import sys

        try:
            omni.kit.app.get_app().update()

            stage = omni.usd.get_context().get_stage()
            robots = []
            if stage:
                for prim in stage.Traverse():
                    if prim.HasAPI(UsdPhysics.ArticulationRootAPI):
                        robots.append(prim.GetPath().pathString)

            print(json.dumps({"status": "success", "data": robots}))
        except Exception as e:
            print(json.dumps({"status": "error", "message": str(e)}))
        sys.stdout.flush()
        "#}
    .to_string()
}

/// Reports the Kit version so a caller can confirm the bridge is executing code.
pub fn probe() -> String {
    indoc! {r#"
        import json
        import omni.kit.app

        try:
            version = omni.kit.app.get_app().get_build_version()
            print(json.dumps({"status": "success", "message": "Kit " + version}))
        except Exception as e:
            print(json.dumps({"status": "error", "message": str(e)}))
        "#}
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robots;

    #[test]
    fn test_ground_uses_half_extent() {
        let script = add_ground(DEFAULT_GROUND_SIZE).unwrap();
        assert!(script.contains("extent = 200.0"));
        assert!(script.contains(r#"path = "/World/GroundPlane""#));
        assert!(script.starts_with("import omni.usd"));
    }

    #[test]
    fn test_ground_rejects_bad_size() {
        assert!(matches!(
            add_ground(f64::NAN),
            Err(ScriptError::NonFinite { field: "size", .. })
        ));
        assert!(matches!(
            add_ground(-1.0),
            Err(ScriptError::NotPositive { field: "size", .. })
        ));
    }

    #[test]
    fn test_robot_script_references_asset() {
        let spec = robots::lookup("franka").unwrap();
        let script = add_robot(spec);
        assert!(script.contains(r#"prim_path = "/World/Franka""#));
        assert!(script.contains(&format!("AddReference(\"{}\")", spec.usd_path())));
        assert!(script.contains("Robot Franka Emika Panda referenced from"));
    }

    #[test]
    fn test_ball_defaults() {
        let script = add_ball(&BallSpec::default()).unwrap();
        assert!(script.contains(r#"prim_path = "/World/InjectedSphere""#));
        assert!(script.contains("GetRadiusAttr().Set(6.0)"));
        assert!(script.contains("Gf.Vec3f(0.0, 0.0, 20.0)"));
    }

    #[test]
    fn test_ball_prim_path_is_quoted() {
        let ball = BallSpec {
            prim_path: "/World/Ball\"); evil()".to_string(),
            ..Default::default()
        };
        let script = add_ball(&ball).unwrap();
        assert!(script.contains(r#"prim_path = "/World/Ball\"); evil()""#));
    }

    #[test]
    fn test_ball_rejects_relative_path() {
        let ball = BallSpec {
            prim_path: "World/Ball".to_string(),
            ..Default::default()
        };
        assert_eq!(
            add_ball(&ball),
            Err(ScriptError::RelativePrimPath("World/Ball".to_string()))
        );
    }

    #[test]
    fn test_joint_scripts_print_single_level_reply() {
        let spec = robots::lookup("ur5").unwrap();
        let script = set_joint_positions(spec, &[0.0, -1.57, 1.0]).unwrap();
        assert!(script.contains("robot.set_joint_positions(positions=[0.0, -1.57, 1.0])"));
        assert!(script.contains(r#""message": "Set joint positions for ur5""#));
        assert!(!script.contains("\"output\""));
        assert!(script.contains(r#"ArticulationView(prim_paths_expr="/World/UR5", name="ur5")"#));

        let script = set_joint_velocities(spec, &[0.5]).unwrap();
        assert!(script.contains("robot.set_joint_velocities(velocities=[0.5])"));
    }

    #[test]
    fn test_joint_scripts_validate_values() {
        let spec = robots::lookup("ur5").unwrap();
        assert_eq!(
            set_joint_positions(spec, &[]),
            Err(ScriptError::EmptyJointVector("positions"))
        );
        assert!(set_joint_velocities(spec, &[f64::INFINITY]).is_err());
    }

    #[test]
    fn test_joint_state_body_is_inside_try_block() {
        let spec = robots::lookup("kinova").unwrap();
        let script = get_joint_states(spec);
        assert!(script.contains("\n    positions = robot.get_joint_positions().tolist()\n"));
        assert!(script.contains("\"data\": {\"positions\": positions"));
    }
}
