//! OBJ / MTL 文件加载器
//!
//! 支持 `v`、`vn`、`f`（`v`、`v/t`、`v//n`、`v/t/n` 形式）、
//! `usemtl`、`mtllib`，材质文件只读取 `newmtl` 与 `Kd`。

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::SplitWhitespace;

use glam::{DVec3, Vec4};

use crate::{RagdollError, Result};

use super::{Face, Group, GroupMap, Mesh, DEFAULT_GROUP};

impl Mesh {
    /// 从文件路径加载 OBJ，顶点按 `p * scale + origin` 变换
    pub fn load<P: AsRef<Path>>(path: P, scale: f64, origin: DVec3) -> Result<Self> {
        let path = path.as_ref();
        let reader = open(path)?;
        let base_dir = path.parent().map(Path::to_path_buf);
        let mesh = Self::parse(reader, path, base_dir.as_deref(), scale, origin)?;
        log::info!(
            "[Mesh] 加载 {}: {} 顶点, {} 法线, {} 三角形, {} 材质",
            path.display(),
            mesh.vertices.len(),
            mesh.normals.len(),
            mesh.face_count(),
            mesh.groups.len()
        );
        Ok(mesh)
    }

    /// 从 Reader 解析 OBJ
    ///
    /// `path` 仅用于错误信息；`base_dir` 用于解析 `mtllib` 相对路径，
    /// 为 `None` 时相对于当前目录。
    pub fn parse<R: BufRead>(
        reader: R,
        path: &Path,
        base_dir: Option<&Path>,
        scale: f64,
        origin: DVec3,
    ) -> Result<Self> {
        let mut mesh = Mesh::new();
        let mut current: Option<String> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let err = |message: String| RagdollError::MeshParse {
                path: path.to_path_buf(),
                line: line_no,
                message,
            };

            let mut tokens = line.split_whitespace();
            let token = match tokens.next() {
                Some(t) if !t.starts_with('#') => t,
                _ => continue,
            };

            match token {
                "v" => {
                    let p = read_vec3(&mut tokens).map_err(err)?;
                    mesh.vertices.push(p * scale + origin);
                }
                "vn" => {
                    let n = read_vec3(&mut tokens).map_err(err)?;
                    mesh.normals.push(n);
                }
                "mtllib" => {
                    let name = tokens
                        .next()
                        .ok_or_else(|| err("mtllib without file name".to_string()))?;
                    let mtl_path = match base_dir {
                        Some(dir) => dir.join(name),
                        None => PathBuf::from(name),
                    };
                    load_materials(&mut mesh.groups, &mtl_path)?;
                }
                "usemtl" => {
                    let name = tokens
                        .next()
                        .ok_or_else(|| err("usemtl without material name".to_string()))?;
                    mesh.groups.entry(name.to_string()).or_default();
                    current = Some(name.to_string());
                }
                "f" => {
                    let face = read_face(&mut tokens, mesh.vertices.len(), mesh.normals.len())
                        .map_err(err)?;
                    let name = current.get_or_insert_with(|| DEFAULT_GROUP.to_string());
                    mesh.groups.entry(name.clone()).or_default().faces.push(face);
                }
                _ => {}
            }
        }

        Ok(mesh)
    }
}

/// 从 MTL 文件加载材质颜色，合并到 `groups`
pub fn load_materials(groups: &mut GroupMap, path: &Path) -> Result<()> {
    let reader = open(path)?;
    parse_materials(reader, path, groups)
}

/// 从 Reader 解析 MTL
pub fn parse_materials<R: BufRead>(reader: R, path: &Path, groups: &mut GroupMap) -> Result<()> {
    let mut current: Option<String> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let err = |message: String| RagdollError::MaterialParse {
            path: path.to_path_buf(),
            line: line_no,
            message,
        };

        let mut tokens = line.split_whitespace();
        let token = match tokens.next() {
            Some(t) if !t.starts_with('#') => t,
            _ => continue,
        };

        match token {
            "newmtl" => {
                let name = tokens
                    .next()
                    .ok_or_else(|| err("newmtl without material name".to_string()))?;
                groups.entry(name.to_string()).or_default();
                current = Some(name.to_string());
            }
            "Kd" => {
                let name = current
                    .as_ref()
                    .ok_or_else(|| err("Kd before newmtl".to_string()))?;
                let c = read_vec3(&mut tokens).map_err(err)?;
                let group: &mut Group = groups.entry(name.clone()).or_default();
                group.diffuse = Vec4::new(c.x as f32, c.y as f32, c.z as f32, 1.0);
            }
            _ => {}
        }
    }

    Ok(())
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|source| RagdollError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

fn read_f64(tokens: &mut SplitWhitespace<'_>) -> std::result::Result<f64, String> {
    let t = tokens
        .next()
        .ok_or_else(|| "missing component".to_string())?;
    t.parse::<f64>()
        .map_err(|_| format!("invalid number '{}'", t))
}

fn read_vec3(tokens: &mut SplitWhitespace<'_>) -> std::result::Result<DVec3, String> {
    let x = read_f64(tokens)?;
    let y = read_f64(tokens)?;
    let z = read_f64(tokens)?;
    Ok(DVec3::new(x, y, z))
}

/// 解析 1 基索引并检查范围
fn parse_index(s: &str, count: usize, what: &str) -> std::result::Result<usize, String> {
    let idx = s
        .parse::<usize>()
        .map_err(|_| format!("invalid {} index '{}'", what, s))?;
    if idx == 0 || idx > count {
        return Err(format!("{} index {} out of range (1..={})", what, idx, count));
    }
    Ok(idx - 1)
}

fn read_face(
    tokens: &mut SplitWhitespace<'_>,
    vertex_count: usize,
    normal_count: usize,
) -> std::result::Result<Face, String> {
    let mut face = Face {
        vert: [0; 3],
        norm: [None; 3],
    };
    for i in 0..3 {
        let t = tokens
            .next()
            .ok_or_else(|| format!("face has {} vertices, expected 3", i))?;
        let mut parts = t.split('/');
        // split 至少产生一个元素
        let v = parts.next().unwrap_or_default();
        face.vert[i] = parse_index(v, vertex_count, "vertex")?;
        let _texcoord = parts.next();
        if let Some(n) = parts.next() {
            if !n.is_empty() {
                face.norm[i] = Some(parse_index(n, normal_count, "normal")?);
            }
        }
    }
    Ok(face)
}
