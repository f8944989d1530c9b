/*!

This is the long-form manual for `group_ranking` and `prosel`.

## Input formats

The following score file formats are supported by `prosel`:
* `csv` long-form score entries
* `xlsx_matrix` score grids in Excel format

### `csv`

One score per line: the project, the criterion and the recorded value.

```text
project,criterion,value
1,1,4
1,2,2
2,1,3
```

A header row is expected by default; the first data row can be moved with
`firstScoreRowIndex`. The columns can be relocated with
`projectColumnIndex`, `criterionColumnIndex` and `valueColumnIndex` (all
1-based, Excel-style letters accepted). When the same (project, criterion)
pair appears on several lines, the last line wins: exports that append
corrected scores at the end of the file are tabulated with the corrections
applied.

### `xlsx_matrix`

A spreadsheet grid: the first column holds the project, the header row
holds the criterion ids, each cell holds a score. Empty cells mean the
project has not been scored against that criterion yet.

|         | 1 | 2 | 3 |
|---------|---|---|---|
| PRJ-001 | 4 | 2 | 5 |
| PRJ-002 | 3 |   | 4 |

The worksheet defaults to the first one in the workbook and can be selected
by name with `excelWorksheetName`.

In both formats projects may be referenced by their numeric id or, with
`"projectsByCode": true`, by their code as declared in the configuration.
Scores must be whole numbers between 1 and 5; rows that do not parse or
fall out of range are skipped with a warning so that one stray line does
not abort a whole tabulation.

## Configuration

`prosel` is driven by a JSON configuration describing the selection round:

```text
{
  "outputSettings": {
    "selectionName": "2024 infrastructure portfolio",
    "selectionDate": "2024-06-01",
    "organization": "regional development board"
  },
  "projects": [
    { "id": 1, "code": "PRJ-001", "name": "harbor upgrade", "location": "north district" },
    { "id": 2, "code": "PRJ-002", "name": "rail link", "status": "proposed" }
  ],
  "fields": [
    {
      "name": "technical",
      "weight": 4,
      "criteria": [
        { "id": 1, "name": "design maturity", "weight": 0.5, "type": "benefit" },
        { "id": 2, "name": "execution risk", "weight": 0.5, "type": "cost" }
      ]
    }
  ],
  "scoreFileSources": [
    { "provider": "csv", "filePath": "scores_technical.csv", "field": "technical" }
  ]
}
```

Notes:
- `fields[].weight` is the institutional weight of the field's vote in the
  consensus (for example supervisory 7, technical 4, financial 2). It must
  be a positive integer.
- `criteria[].weight` must lie in (0, 1]; `criteria[].type` is either
  `benefit` (higher is better) or `cost` (lower is better).
- `filePath` is resolved relative to the configuration file.
- A field may have no score source yet. It is then carried through the
  consensus with an empty ranking, which is the normal state while the
  evaluation round is still in progress.

## Output

The summary is printed to the standard output and, with `--out`, written to
a file. Scores are rendered with 4 decimals. With `--reference`, the
computed summary is compared against a previously saved one and any
difference is reported as an error, which makes regression checks over
recorded rounds a one-liner.

*/
