/// STL file parser for binary and ASCII formats
use std::path::Path;

use log::debug;
use nom::{
    bytes::complete::tag,
    character::complete::{multispace0, multispace1, not_line_ending},
    combinator::{cut, opt},
    multi::{count, many0},
    number::complete::float,
    sequence::{delimited, pair, preceded},
    IResult,
};
use thiserror::Error;

use crate::geometry::{Mesh, Triangle, Vertex};

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;

/// Reasons a mesh file could not be turned into geometry
#[derive(Debug, Error)]
pub enum StlError {
    #[error("failed to read STL file: {0}")]
    Io(#[from] std::io::Error),
    #[error("file too small to be a valid STL ({0} bytes)")]
    TooShort(usize),
    #[error("unexpected end of file: header declares {expected} triangles, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("invalid ASCII STL at line {line}: unexpected `{found}`")]
    Ascii { line: usize, found: String },
    #[error("the STL file contains no geometry")]
    EmptyGeometry,
}

/// Read and parse an STL file, rejecting files without any geometry point
pub fn load_stl(path: impl AsRef<Path>) -> Result<Mesh, StlError> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let mesh = parse_stl(&data)?;
    debug!(
        "parsed {} triangles from {}",
        mesh.triangles.len(),
        path.display()
    );

    if mesh.point_count() == 0 {
        return Err(StlError::EmptyGeometry);
    }
    Ok(mesh)
}

/// Detect and parse STL data (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh, StlError> {
    // Binary files may also start with "solid", so ASCII is only a first guess
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            match parse_ascii_stl(text) {
                Ok(mesh) => return Ok(mesh),
                Err(err) if data.len() < HEADER_LEN + 4 => return Err(err),
                Err(err) => debug!("not an ASCII STL ({err}), trying binary"),
            }
        }
    }

    parse_binary_stl(data)
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, StlError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(StlError::TooShort(data.len()));
    }

    let body = &data[HEADER_LEN..];
    let expected = read_u32(body, 0) as usize;
    let records = &body[4..];
    let found = records.len() / RECORD_LEN;
    if found < expected {
        return Err(StlError::Truncated { expected, found });
    }

    let mut mesh = Mesh::with_capacity(expected);
    for record in records.chunks_exact(RECORD_LEN).take(expected) {
        let [nx, ny, nz] = read_vec3(record, 0);
        let vertices = [12, 24, 36].map(|offset| {
            let [x, y, z] = read_vec3(record, offset);
            Vertex::new(x, y, z, nx, ny, nz)
        });
        // Trailing 2-byte attribute count is ignored
        mesh.add_triangle(Triangle { vertices });
    }

    Ok(mesh)
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn read_vec3(data: &[u8], offset: usize) -> [f32; 3] {
    [0, 4, 8].map(|i| f32::from_bits(read_u32(data, offset + i)))
}

/// Parse an ASCII STL file. Errors carry the 1-based line of the offending
/// token.
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, StlError> {
    match solid(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(ascii_error(input, e.input)),
        Err(nom::Err::Incomplete(_)) => Err(ascii_error(input, "")),
    }
}

fn ascii_error(input: &str, rest: &str) -> StlError {
    let offset = input.len() - rest.len();
    StlError::Ascii {
        line: input[..offset].matches('\n').count() + 1,
        found: rest.lines().next().unwrap_or_default().trim().to_string(),
    }
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    preceded(multispace0, tag(word))
}

fn solid(input: &str) -> IResult<&str, Mesh> {
    // The solid name is free text up to the end of the line
    let (input, _) = pair(keyword("solid"), not_line_ending)(input)?;
    let (input, triangles) = many0(facet)(input)?;
    let (input, _) = pair(keyword("endsolid"), opt(not_line_ending))(input)?;
    Ok((input, Mesh { triangles }))
}

/// One `facet ... endfacet` block. Once `facet` has matched, a malformed
/// body is a hard failure so the error points inside the block.
fn facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = keyword("facet")(input)?;
    cut(facet_body)(input)
}

fn facet_body(input: &str) -> IResult<&str, Triangle> {
    let (input, [nx, ny, nz]) = delimited(
        keyword("normal"),
        triple,
        pair(keyword("outer"), keyword("loop")),
    )(input)?;
    let (input, corners) = count(preceded(keyword("vertex"), triple), 3)(input)?;
    let (input, _) = pair(keyword("endloop"), keyword("endfacet"))(input)?;

    let vertices =
        [corners[0], corners[1], corners[2]].map(|[x, y, z]| Vertex::new(x, y, z, nx, ny, nz));
    Ok((input, Triangle { vertices }))
}

fn triple(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, x) = preceded(multispace1, float)(input)?;
    let (input, y) = preceded(multispace1, float)(input)?;
    let (input, z) = preceded(multispace1, float)(input)?;
    Ok((input, [x, y, z]))
}

/// Encode a mesh as binary STL. Used to produce fixtures and exports.
pub fn write_binary_stl(mesh: &Mesh) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + 4 + mesh.triangles.len() * RECORD_LEN);
    out.resize(HEADER_LEN, 0);
    out.extend_from_slice(&(mesh.triangles.len() as u32).to_le_bytes());

    for triangle in &mesh.triangles {
        let n = triangle.vertices[0].normal;
        for value in [n.x, n.y, n.z] {
            out.extend_from_slice(&value.to_le_bytes());
        }
        for vertex in &triangle.vertices {
            let p = vertex.position;
            for value in [p.x, p.y, p.z] {
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
        out.extend_from_slice(&0u16.to_le_bytes());
    }
    out
}
