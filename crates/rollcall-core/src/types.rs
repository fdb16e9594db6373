use std::fmt;

/// Numeric identity key, supplied by the operator at registration time.
pub type PersonId = u32;

/// Role-specific attribute carried by every person.
///
/// Closed variant set: persistence and display switch on the tag, never on
/// runtime type identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Student { department: String },
    Teacher { subject: String },
}

impl Role {
    /// Build a role from the registration form's selector letter.
    ///
    /// `S`/`s` keeps the department, `T`/`t` keeps the subject; anything else
    /// is rejected and the caller aborts the registration.
    pub fn from_tag(tag: char, department: String, subject: String) -> Option<Role> {
        match tag.to_ascii_lowercase() {
            's' => Some(Role::Student { department }),
            't' => Some(Role::Teacher { subject }),
            _ => None,
        }
    }

    /// Field label used in persisted records ("Department" or "Subject").
    pub fn attribute_name(&self) -> &'static str {
        match self {
            Role::Student { .. } => "Department",
            Role::Teacher { .. } => "Subject",
        }
    }

    /// The role-specific attribute value.
    pub fn attribute(&self) -> &str {
        match self {
            Role::Student { department } => department,
            Role::Teacher { subject } => subject,
        }
    }
}

/// A registered identity. Created during interactive registration and held
/// for the process lifetime; never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub role: Role,
}

impl fmt::Display for Person {
    /// Renders the persisted record form:
    /// `ID: <n>, Name: <s>, Department: <s>` (or `Subject:` for teachers).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Name: {}, {}: {}",
            self.id,
            self.name,
            self.role.attribute_name(),
            self.role.attribute()
        )
    }
}

/// Axis-aligned face region in frame coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Raw detection hits merged into this region. More neighbors = stronger.
    pub neighbors: u32,
}

/// A grayscale face image: a stored reference or a freshly cropped probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceSample {
    /// Row-major grayscale pixels, `width * height` bytes.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl FaceSample {
    /// Take ownership of a whole grayscale frame as a sample.
    pub fn from_raw(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(data.len(), (width * height) as usize);
        Self { data, width, height }
    }

    /// Crop a region out of a grayscale frame, clamped to the frame bounds.
    pub fn crop(frame: &[u8], frame_width: u32, frame_height: u32, region: &FaceRegion) -> Self {
        let x0 = region.x.min(frame_width);
        let y0 = region.y.min(frame_height);
        let w = region.width.min(frame_width - x0);
        let h = region.height.min(frame_height - y0);

        let mut data = Vec::with_capacity((w * h) as usize);
        for row in y0..y0 + h {
            let start = (row * frame_width + x0) as usize;
            data.extend_from_slice(&frame[start..start + w as usize]);
        }

        Self { data, width: w, height: h }
    }
}
