//! SQL used by the judging store. Tables are created by the workspace
//! migrations.

/// Every competitor of a group joined with their attempts for one lift.
/// Competitors are returned in registration order.
pub const SELECT_COMPETITOR_ATTEMPTS: &str = r"
SELECT c.id AS competitor_id,
       c.name,
       c.bodyweight,
       a.id AS attempt_id,
       a.round,
       a.weight,
       a.status
FROM competitors c
LEFT JOIN attempts a
       ON a.competitor_id = c.id
      AND a.lift_id = $2
WHERE c.group_id = $1
ORDER BY c.created_at, c.id, a.round
";

/// One attempt by id.
pub const SELECT_ATTEMPT: &str = r"
SELECT a.id, a.competitor_id, c.group_id, a.lift_id, a.round, a.weight, a.status, a.override_reason
FROM attempts a
JOIN competitors c ON c.id = a.competitor_id
WHERE a.id = $1
";

/// Status write for one attempt.
pub const UPDATE_ATTEMPT_STATUS: &str = r"
UPDATE attempts
SET status = $2, override_reason = $3, updated_at = NOW()
WHERE id = $1
";

/// A context's progression pointer.
pub const SELECT_CURRENT_STATE: &str = r"
SELECT round, current_competitor_id, completed, version, updated_at
FROM current_states
WHERE group_id = $1 AND lift_id = $2
";

/// First write of a context's pointer; a concurrent first write wins.
pub const INSERT_CURRENT_STATE: &str = r"
INSERT INTO current_states
    (group_id, lift_id, round, current_competitor_id, completed, version, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT (group_id, lift_id) DO NOTHING
";

/// Compare-and-swap write of a context's pointer on its version.
pub const UPDATE_CURRENT_STATE: &str = r"
UPDATE current_states
SET round = $3,
    current_competitor_id = $4,
    completed = $5,
    version = $6,
    updated_at = $7
WHERE group_id = $1 AND lift_id = $2 AND version = $8
";

/// Stored version of a context's pointer.
pub const SELECT_CURRENT_VERSION: &str = r"
SELECT version FROM current_states WHERE group_id = $1 AND lift_id = $2
";
