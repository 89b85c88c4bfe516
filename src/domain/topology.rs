//! Landmark connection topologies.

/// A fixed landmark layout: how many points a set has and which pairs are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    /// Short name, also used to locate the bundled pipeline assets.
    pub name: &'static str,
    /// Number of points in one landmark set.
    pub num_points: usize,
    /// Point index pairs drawn as lines.
    pub connections: &'static [(usize, usize)],
}

/// The 21-point hand layout: wrist, then four joints per finger from thumb to pinky.
pub static HAND: Topology = Topology {
    name: "hand",
    num_points: 21,
    connections: &[
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 4),
        (0, 5),
        (5, 6),
        (6, 7),
        (7, 8),
        (5, 9),
        (9, 10),
        (10, 11),
        (11, 12),
        (9, 13),
        (13, 14),
        (14, 15),
        (15, 16),
        (13, 17),
        (0, 17),
        (17, 18),
        (18, 19),
        (19, 20),
    ],
};

/// The 33-point body pose layout.
pub static POSE: Topology = Topology {
    name: "pose",
    num_points: 33,
    connections: &[
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 7),
        (0, 4),
        (4, 5),
        (5, 6),
        (6, 8),
        (9, 10),
        (11, 12),
        (11, 13),
        (13, 15),
        (15, 17),
        (15, 19),
        (15, 21),
        (17, 19),
        (12, 14),
        (14, 16),
        (16, 18),
        (16, 20),
        (16, 22),
        (18, 20),
        (11, 23),
        (12, 24),
        (23, 24),
        (23, 25),
        (24, 26),
        (25, 27),
        (26, 28),
        (27, 29),
        (28, 30),
        (29, 31),
        (30, 32),
        (27, 31),
        (28, 32),
    ],
};
